//! Terminal typesetting for inline math markup.
//!
//! The engine is a service owned by whichever UI displays messages: it is
//! initialized once, can be asked to typeset any number of times, and is shut
//! down when the UI exits. Typesetting turns the LaTeX produced by the
//! formatter and sanitizer into plain Unicode a terminal can show. HTML-ish
//! emphasis tags are left alone for the UI to style.

use log::debug;
use regex::{Captures, Regex};
use std::sync::OnceLock;

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("typeset regex must compile"))
        }
    };
}

regex!(frac, r"\\frac\{([^{}]*)\}\{([^{}]*)\}");
regex!(sqrt, r"\\sqrt\{([^{}]*)\}");
regex!(braced_power, r"\^\{([^{}]*)\}");
regex!(pmatrix, r"(?s)\\begin\{pmatrix\}(.*?)\\end\{pmatrix\}");
regex!(function_name, r"\\(sin|cos|tan|log|ln)\b");

/// Symbol commands and their Unicode glyphs. A trailing space after the
/// command is part of LaTeX syntax and is dropped with it.
const SYMBOLS: &[(&str, &str)] = &[
    ("cdot", "·"),
    ("times", "×"),
    ("div", "÷"),
    ("pm", "±"),
    ("neq", "≠"),
    ("leq", "≤"),
    ("geq", "≥"),
    ("le", "≤"),
    ("ge", "≥"),
    ("pi", "π"),
    ("theta", "θ"),
    ("infty", "∞"),
];

/// Anything that can turn markup into display text.
pub trait Typesetter {
    fn typeset(&self, markup: &str) -> String;
}

/// Which delimiters mark math in the markup.
#[derive(Debug, Clone)]
pub struct TypesetConfig {
    pub inline: (String, String),
    pub display: (String, String),
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            inline: (r"\(".to_string(), r"\)".to_string()),
            display: (r"\[".to_string(), r"\]".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Ready,
}

/// Unicode typesetting engine with an explicit lifecycle.
#[derive(Debug, Clone)]
pub struct TypesetEngine {
    config: TypesetConfig,
    state: EngineState,
    symbols: Vec<(Regex, &'static str)>,
}

impl Default for TypesetEngine {
    fn default() -> Self {
        Self::new(TypesetConfig::default())
    }
}

impl TypesetEngine {
    pub fn new(config: TypesetConfig) -> Self {
        Self {
            config,
            state: EngineState::Unloaded,
            symbols: Vec::new(),
        }
    }

    /// Load the engine. Returns `false` if it was already ready.
    pub fn init(&mut self) -> bool {
        if self.state == EngineState::Ready {
            return false;
        }

        self.symbols = SYMBOLS
            .iter()
            .map(|(name, glyph)| {
                let re = Regex::new(&format!(r"\\{}\b ?", name))
                    .expect("symbol regex must compile");
                (re, *glyph)
            })
            .collect();
        self.state = EngineState::Ready;
        debug!("Typesetting engine ready ({} symbols)", self.symbols.len());
        true
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Unload the engine; a later `init` starts it again.
    pub fn shutdown(&mut self) {
        if self.state == EngineState::Ready {
            self.symbols.clear();
            self.state = EngineState::Unloaded;
            debug!("Typesetting engine unloaded");
        }
    }

    fn math(&self, body: &str) -> String {
        let mut text = pmatrix()
            .replace_all(body, |caps: &Captures| matrix(&caps[1]))
            .into_owned();

        // Innermost first so nested fractions and roots resolve
        loop {
            let fractions = frac()
                .replace_all(&text, |caps: &Captures| {
                    format!("{}/{}", group(&caps[1]), group(&caps[2]))
                })
                .into_owned();
            let next = sqrt().replace_all(&fractions, "√($1)").into_owned();
            if next == text {
                break;
            }
            text = next;
        }

        let text = braced_power().replace_all(&text, |caps: &Captures| power(&caps[1]));
        let mut text = function_name().replace_all(&text, "$1").into_owned();

        for (re, glyph) in &self.symbols {
            text = re.replace_all(&text, *glyph).into_owned();
        }

        text
    }
}

impl Typesetter for TypesetEngine {
    fn typeset(&self, markup: &str) -> String {
        if !self.is_ready() {
            return markup.to_string();
        }

        let mut out = markup.to_string();
        for (open, close) in [&self.config.display, &self.config.inline] {
            out = self.typeset_spans(&out, open, close);
        }
        out
    }
}

impl TypesetEngine {
    fn typeset_spans(&self, text: &str, open: &str, close: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(open) {
            let after_open = &rest[start + open.len()..];
            let Some(end) = after_open.find(close) else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push_str(&self.math(&after_open[..end]));
            rest = &after_open[end + close.len()..];
        }
        out.push_str(rest);

        out
    }
}

/// Parenthesize compound fraction operands: `(x+1)/2`, but `x/2`.
fn group(operand: &str) -> String {
    let operand = operand.trim();
    if operand.chars().all(|c| c.is_alphanumeric() || c == '.') {
        operand.to_string()
    } else {
        format!("({})", operand)
    }
}

fn power(exponent: &str) -> String {
    let superscript: Option<String> = exponent
        .chars()
        .map(|c| match c {
            '0' => Some('⁰'),
            '1' => Some('¹'),
            '2' => Some('²'),
            '3' => Some('³'),
            '4' => Some('⁴'),
            '5' => Some('⁵'),
            '6' => Some('⁶'),
            '7' => Some('⁷'),
            '8' => Some('⁸'),
            '9' => Some('⁹'),
            '-' => Some('⁻'),
            'n' => Some('ⁿ'),
            _ => None,
        })
        .collect();

    match superscript {
        Some(s) if !s.is_empty() => s,
        _ => format!("^({})", exponent),
    }
}

/// `1 & 2 \\ 3 & 4` -> `[1 2; 3 4]`
fn matrix(body: &str) -> String {
    let rows: Vec<String> = body
        .split(r"\\")
        .map(|row| {
            row.split('&')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|row| !row.is_empty())
        .collect();
    format!("[{}]", rows.join("; "))
}
