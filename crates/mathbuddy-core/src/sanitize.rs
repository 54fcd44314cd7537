//! Cleanup of raw model output before it reaches the formatter.
//!
//! Strips `<think>` commentary and filler openers, turns markdown emphasis
//! into HTML-ish markup, normalizes `$...$` math, then appends at most one
//! reaction glyph.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("sanitizer regex must compile"))
        }
    };
}

regex!(think_block, r"(?s)<think>.*?</think>");
regex!(think_tag, r"</?think>");
regex!(
    filler_opener,
    r"(?mi)^(Thinking:|I need to:|Let me think:|Hmm,|Okay,|Let's see,|Now,)"
);
regex!(bold, r"\*\*(.*?)\*\*");
regex!(italic, r"\*([^*\n]+)\*");
regex!(dollar_span, r"\$[^$]*\$");
regex!(dollar_math, r"\$\s*([^$]+?)\s*\$");
regex!(
    explanation,
    r"(?i)(\\To|To) (multiply|add|subtract|compute|solve|find|calculate) ([^.]+\.)"
);
regex!(
    example_lead_in,
    r"(?i)(For instance,|For example,|Let's try|Let's calculate)"
);
regex!(whitespace, r"\s+");
regex!(praise, r"(?i)correct|right|exactly|perfect|well done|good job");
regex!(progress, r"(?i)progress|getting there|close|almost");
regex!(correction, r"(?i)try again|incorrect|not quite|wrong");

/// Glyph appended to a response based on its tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Praise,
    Progress,
    Correction,
}

impl Reaction {
    /// First matching keyword set wins: praise, then progress, then correction.
    pub fn detect(text: &str) -> Option<Self> {
        if praise().is_match(text) {
            Some(Reaction::Praise)
        } else if progress().is_match(text) {
            Some(Reaction::Progress)
        } else if correction().is_match(text) {
            Some(Reaction::Correction)
        } else {
            None
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Reaction::Praise => "🎉",
            Reaction::Progress => "🌟",
            Reaction::Correction => "🤔",
        }
    }
}

/// Italicize `*text*` everywhere except inside `$...$` spans.
fn italicize_outside_math(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for span in dollar_span().find_iter(text) {
        out.push_str(&italic().replace_all(&text[last..span.start()], "<em>$1</em>"));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&italic().replace_all(&text[last..], "<em>$1</em>"));

    out
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Clean a raw assistant reply for display. Never fails; text that matches
/// none of the rules passes through with only whitespace normalized.
pub fn clean_model_response(raw: &str) -> String {
    let text = think_block().replace_all(raw, "");
    let text = think_tag().replace_all(&text, "");
    let text = filler_opener().replace_all(&text, "");

    let text = bold().replace_all(&text, "<strong>$1</strong>");
    let text = italicize_outside_math(&text);

    let text = dollar_math().replace_all(&text, r"\($1\)");

    let text = text
        .replace(r"\begin{pmatrix}", r"\begin{pmatrix} ")
        .replace(r"\end{pmatrix}", r" \end{pmatrix}");

    let text = explanation().replace_all(&text, "$1 $2 $3<br/>");
    let text = example_lead_in().replace_all(&text, "<br/>$1");

    let mut text = whitespace().replace_all(&text, " ").trim().to_string();

    if let Some(reaction) = Reaction::detect(&text) {
        text.push(' ');
        text.push_str(reaction.glyph());
    }

    capitalize_first(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_praise() {
        assert_eq!(
            clean_model_response("**correct** job"),
            "<strong>correct</strong> job 🎉"
        );
    }

    #[test]
    fn test_glyph_appended_once_with_priority() {
        // praise beats correction even though both match
        let cleaned = clean_model_response("that's right, not quite finished though");
        assert!(cleaned.ends_with("🎉"));
        assert_eq!(cleaned.matches('🎉').count(), 1);
        assert!(!cleaned.contains('🤔'));
    }

    #[test]
    fn test_incorrect_counts_as_praise() {
        // "incorrect" contains "correct"; the praise set is checked first
        assert_eq!(Reaction::detect("that is incorrect"), Some(Reaction::Praise));
    }

    #[test]
    fn test_progress_and_correction() {
        assert_eq!(Reaction::detect("You're almost there"), Some(Reaction::Progress));
        assert_eq!(Reaction::detect("Please try again"), Some(Reaction::Correction));
        assert_eq!(Reaction::detect("What is 3 plus 4?"), None);
    }

    #[test]
    fn test_think_blocks_removed_across_lines() {
        let raw = "<think>\nthe student wants\nthe answer\n</think>\nWhat do you get for 3 + 4?";
        assert_eq!(clean_model_response(raw), "What do you get for 3 + 4?");
    }

    #[test]
    fn test_stray_think_tags_removed() {
        assert_eq!(clean_model_response("</think>what next?"), "What next?");
    }

    #[test]
    fn test_filler_openers_removed_per_line() {
        let raw = "Okay, what is 5 times 2?\nHmm, and then?";
        assert_eq!(clean_model_response(raw), "What is 5 times 2? and then?");
    }

    #[test]
    fn test_every_filler_opener_removed() {
        for opener in ["Thinking:", "I need to:", "Let me think:", "Let's see,", "Now,"] {
            let raw = format!("{} what is 3 + 4?", opener);
            assert_eq!(clean_model_response(&raw), "What is 3 + 4?", "opener {:?}", opener);
        }
        assert_eq!(clean_model_response("now, what is 3 + 4?"), "What is 3 + 4?");
    }

    #[test]
    fn test_filler_inside_a_line_is_kept() {
        assert_eq!(
            clean_model_response("We add them. Now, what is next?"),
            "We add them. Now, what is next?"
        );
        assert_eq!(
            clean_model_response("First step: Let me think: what is 6 minus 1?"),
            "First step: Let me think: what is 6 minus 1?"
        );
    }

    #[test]
    fn test_dollar_math_becomes_inline_delimiters() {
        assert_eq!(
            clean_model_response("what is $ x^2 $ when x is 3?"),
            "What is \\(x^2\\) when x is 3?"
        );
    }

    #[test]
    fn test_italic_skipped_inside_math() {
        assert_eq!(
            clean_model_response("an *important* step: $2*3*4$"),
            "An <em>important</em> step: \\(2*3*4\\)"
        );
    }

    #[test]
    fn test_matrix_delimiters_padded() {
        assert_eq!(
            clean_model_response(r"\begin{pmatrix}1 & 2\end{pmatrix}"),
            r"\begin{pmatrix} 1 & 2 \end{pmatrix}"
        );
    }

    #[test]
    fn test_line_breaks_around_explanations() {
        assert_eq!(
            clean_model_response("To add fractions, find a common denominator. For example, 1/2 and 1/3."),
            "To add fractions, find a common denominator.<br/> <br/>For example, 1/2 and 1/3."
        );
    }

    #[test]
    fn test_whitespace_collapsed_and_first_letter_capitalized() {
        assert_eq!(clean_model_response("  what   is\n\n 7 - 2?  "), "What is 7 - 2?");
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(clean_model_response(""), "");
    }
}
