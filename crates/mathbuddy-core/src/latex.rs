//! Plain text to typesetting markup.
//!
//! Two paths: a message that starts with a command verb ("solve", "find", ...)
//! is treated as one equation and wrapped in a single `\( \)` pair; anything
//! else is scanned for arithmetic idioms, each wrapped in its own pair.
//!
//! Both paths are ordered lists of regex substitutions. Each rule rewrites the
//! whole string before the next one runs, so later rules see earlier output.
//! The order is load-bearing.

use regex::Regex;
use std::sync::OnceLock;

/// Verbs that mark the rest of the message as a single equation.
const COMMANDS: &str = "solve|calculate|find|evaluate|simplify";

/// Rules for the body of a command message (no delimiters added).
const EQUATION_RULES: &[(&str, &str)] = &[
    // Fractions
    (r"([0-9]+)/([0-9]+)", r"\frac{$1}{$2}"),
    (r"([a-zA-Z])/([0-9]+)", r"\frac{$1}{$2}"),
    (r"([0-9]+)/([a-zA-Z])", r"\frac{$1}{$2}"),
    (r"([a-zA-Z])/([a-zA-Z])", r"\frac{$1}{$2}"),
    // Exponents, numeric first
    (r"([a-zA-Z0-9])(\^)([0-9]+)", r"$1^{$3}"),
    (r"([a-zA-Z0-9])\^([a-zA-Z0-9_]+)", r"$1^{$2}"),
    (r"\*", r"\cdot "),
    (r"sqrt\(([^)]+)\)", r"\sqrt{$1}"),
    (r"\bsin\(", r"\sin("),
    (r"\bcos\(", r"\cos("),
    (r"\btan\(", r"\tan("),
    (r"\blog\(", r"\log("),
    (r"\bln\(", r"\ln("),
    (r"\bpi\b", r"\pi "),
];

/// Rules for free text. Every hit becomes its own ` \(...\) ` span.
const INLINE_RULES: &[(&str, &str)] = &[
    (r"([0-9]+)/([0-9]+)", r" \(\frac{$1}{$2}\) "),
    (r"([a-zA-Z])/([0-9]+)", r" \(\frac{$1}{$2}\) "),
    (r"([0-9]+)/([a-zA-Z])", r" \(\frac{$1}{$2}\) "),
    (r"([a-zA-Z])/([a-zA-Z])", r" \(\frac{$1}{$2}\) "),
    (r"([a-zA-Z0-9])\^([0-9]+)", r" \($1^{$2}\) "),
    (r"([a-zA-Z0-9])\^([a-zA-Z])", r" \($1^{$2}\) "),
    // Quadratic: ax^2+bx+c=d
    (
        r"([0-9]*[a-zA-Z])\^2([+\-][0-9]*[a-zA-Z][+\-][0-9]+)=([0-9]+)",
        r" \($1^{2}$2=$3\) ",
    ),
    // Linear: ax+b=c
    (r"([0-9]*[a-zA-Z][+\-][0-9]+)=([0-9]+)", r" \($1=$2\) "),
    // Inequality
    (
        r"([0-9]*[a-zA-Z][+\-][0-9]*)\s*(>|<|>=|<=)\s*([0-9]+)",
        r" \($1 $2 $3\) ",
    ),
];

type RuleSet = Vec<(Regex, &'static str)>;

fn compile(rules: &'static [(&'static str, &'static str)]) -> RuleSet {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("formatter rule must compile"), *replacement)
        })
        .collect()
}

fn equation_rules() -> &'static RuleSet {
    static RULES: OnceLock<RuleSet> = OnceLock::new();
    RULES.get_or_init(|| compile(EQUATION_RULES))
}

fn inline_rules() -> &'static RuleSet {
    static RULES: OnceLock<RuleSet> = OnceLock::new();
    RULES.get_or_init(|| compile(INLINE_RULES))
}

fn command_test() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)^({})\b", COMMANDS)).expect("command regex"))
}

fn command_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)^({})\s+", COMMANDS)).expect("command regex"))
}

fn apply(rules: &RuleSet, text: &str) -> String {
    rules.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, *replacement).into_owned()
    })
}

/// Convert a chat line to markup with inline math delimiters.
pub fn convert_to_latex(text: &str) -> String {
    if command_test().is_match(text) {
        // "solve:" passes the word-boundary test but has no whitespace after
        // the verb, so the prefix is empty and the verb lands inside the math.
        let command = command_prefix()
            .find(text)
            .map(|m| m.as_str())
            .unwrap_or("");
        let equation = &text[command.len()..];
        return format!("{}\\({}\\)", command, equation_body(equation));
    }

    inline_math(text)
}

/// Rewrite an equation into a LaTeX math body, without delimiters.
pub fn equation_body(equation: &str) -> String {
    apply(equation_rules(), equation)
}

/// Wrap every recognizable math idiom in `text` in its own inline span.
pub fn inline_math(text: &str) -> String {
    apply(inline_rules(), text)
}
