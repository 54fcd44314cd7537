//! Styling of the HTML-ish emphasis markup the sanitizer produces.
//!
//! Only `<strong>`, `<em>` and `<br/>` are understood. Anything else that
//! looks like a tag is shown as typed.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

const BREAK: &str = "<br/>";

const TAGS: [(&str, Modifier, bool); 4] = [
    ("<strong>", Modifier::BOLD, true),
    ("</strong>", Modifier::BOLD, false),
    ("<em>", Modifier::ITALIC, true),
    ("</em>", Modifier::ITALIC, false),
];

/// Split a message on `<br/>` and style each piece.
pub fn to_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    text.split(BREAK)
        .map(|segment| parse_line(segment.trim(), base))
        .collect()
}

/// Number of lines a message occupies when word-wrapped to `width` columns,
/// matching the chat pane's `Paragraph` wrapping.
pub fn wrapped_height(text: &str, width: usize) -> usize {
    let width = width.max(1);
    text.split(BREAK)
        .map(|segment| segment_height(&strip_tags(segment.trim()), width))
        .sum()
}

fn segment_height(text: &str, width: usize) -> usize {
    let mut lines = 1;
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        if line_width > 0 && line_width + 1 + word_width <= width {
            line_width += 1 + word_width;
            continue;
        }
        if line_width > 0 {
            lines += 1;
        }
        // A word wider than the pane is broken across lines
        lines += word_width.saturating_sub(1) / width;
        line_width = match word_width % width {
            0 if word_width > 0 => width,
            rest => rest,
        };
    }

    lines
}

fn strip_tags(text: &str) -> String {
    TAGS.iter()
        .fold(text.to_string(), |acc, (tag, _, _)| acc.replace(tag, ""))
}

fn parse_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut modifiers = Modifier::empty();
    let mut rest = text;

    while !rest.is_empty() {
        let tag = TAGS.iter().find(|(tag, _, _)| rest.starts_with(tag));

        if let Some((tag, modifier, opening)) = tag {
            if !current_text.is_empty() {
                spans.push(Span::styled(
                    std::mem::take(&mut current_text),
                    base.add_modifier(modifiers),
                ));
            }
            if *opening {
                modifiers.insert(*modifier);
            } else {
                modifiers.remove(*modifier);
            }
            rest = &rest[tag.len()..];
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            current_text.push(c);
        }
        rest = chars.as_str();
    }

    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base.add_modifier(modifiers)));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_and_italic_spans() {
        let lines = to_lines("<strong>Great</strong> work, an <em>integer</em>", Style::default());
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, "Great");
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, " work, an ");
        assert!(spans[1].style.add_modifier.is_empty());
        assert_eq!(spans[2].content, "integer");
        assert!(spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_breaks_split_lines() {
        let lines = to_lines(
            "To add fractions, find a common denominator.<br/> <br/>For example, 1/2.",
            Style::default(),
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(plain(&lines[0]), "To add fractions, find a common denominator.");
        assert_eq!(lines[1], Line::default());
        assert_eq!(plain(&lines[2]), "For example, 1/2.");
    }

    #[test]
    fn test_unknown_tags_kept_literal() {
        let lines = to_lines("a <b>c</b>", Style::default());
        assert_eq!(plain(&lines[0]), "a <b>c</b>");
    }

    #[test]
    fn test_nested_emphasis() {
        let lines = to_lines("<strong>very <em>much</em></strong>", Style::default());
        let spans = &lines[0].spans;
        assert_eq!(spans.len(), 2);
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height("<strong>abcd</strong>", 2), 2);
        assert_eq!(wrapped_height("abc<br/>", 10), 2);
        assert_eq!(wrapped_height("abcde", 2), 3);
    }

    #[test]
    fn test_wrapped_height_moves_whole_words() {
        // 12 columns of text, but no two words share a 6-column line
        assert_eq!(wrapped_height("abcd ab abcd", 6), 3);
        assert_eq!(wrapped_height("ab cd ef", 5), 2);
        // the emoji is two columns wide
        assert_eq!(wrapped_height("ab 🎉", 4), 2);
        // a long word starts its own line, then breaks
        assert_eq!(wrapped_height("ab abcdefg", 4), 3);
    }
}
