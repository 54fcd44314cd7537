//! Detection, extraction and interpretation of plottable math in tutor replies.
//!
//! Two constructs are understood: two-variable linear equations (`2x + 3y = 6`)
//! and named 2D vectors (`vector A = (1, 2)`). Everything is regex matching,
//! not parsing.

use log::warn;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("equation regex must compile"))
        }
    };
}

// Detection patterns (case-insensitive)
regex!(linear_any_case, r"(?i)[0-9]*x\s*[+\-]\s*[0-9]*y\s*=\s*[0-9]+");
regex!(matrix_env, r"(?i)\\begin\{pmatrix\}|\\begin\{bmatrix\}|\\begin\{matrix\}");
regex!(
    vector_definition,
    r"(?i)vector\s+([A-Za-z])\s*=\s*\(\s*(-?[0-9]+)\s*,\s*(-?[0-9]+)\s*\)"
);
regex!(vector_addition, r"(?i)vector\s+[A-Za-z]\s*\+\s*vector\s+[A-Za-z]");
regex!(plot_request, r"(?i)plot|draw|graph|visualize");

// Extraction only picks up lowercase x/y equations
regex!(linear_equation, r"[0-9]*x\s*[+\-]\s*[0-9]*y\s*=\s*[0-9]+");

regex!(slope_form, r"(?i)(-?[0-9]*)x([+-][0-9]*)y=(-?[0-9]+)");
regex!(whitespace, r"\s+");
regex!(vector_word, r"(?i)vector");

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeIntercept {
    pub slope: f64,
    pub intercept: f64,
}

impl SlopeIntercept {
    /// What an equation that can't be interpreted turns into.
    pub const ZERO: SlopeIntercept = SlopeIntercept { slope: 0.0, intercept: 0.0 };

    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// A 2D vector drawn from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorPoint {
    pub x: i64,
    pub y: i64,
}

/// Does the text contain anything worth plotting?
pub fn can_plot(text: &str) -> bool {
    linear_any_case().is_match(text)
        || matrix_env().is_match(text)
        || vector_definition().is_match(text)
        || vector_addition().is_match(text)
        || plot_request().is_match(text)
}

/// Every linear equation in the text, then every vector definition.
///
/// The two scans are independent; results are not ordered by position.
pub fn extract_equations(text: &str) -> Vec<String> {
    linear_equation()
        .find_iter(text)
        .chain(vector_definition().find_iter(text))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether a set of extracted equations should be drawn as vectors.
pub fn is_vector_set(equations: &[String]) -> bool {
    vector_word().is_match(&equations.join(" "))
}

fn coefficient(capture: &str) -> Option<f64> {
    match capture {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        digits => digits.parse::<f64>().ok(),
    }
}

/// Convert `ax + by = c` into slope-intercept form.
///
/// Returns [`SlopeIntercept::ZERO`] when the equation doesn't match or `b` is
/// zero, so a bad equation plots as the x-axis instead of failing.
pub fn slope_intercept(equation: &str) -> SlopeIntercept {
    let compact = whitespace().replace_all(equation, "");

    let parsed = slope_form().captures(&compact).and_then(|caps| {
        let a = coefficient(&caps[1])?;
        let b = coefficient(&caps[2])?;
        let c = caps[3].parse::<f64>().ok()?;
        Some((a, b, c))
    });

    match parsed {
        Some((a, b, c)) if b != 0.0 => SlopeIntercept {
            slope: -a / b,
            intercept: c / b,
        },
        Some(_) => {
            warn!("Equation {:?} has no y term, plotting as zero line", equation);
            SlopeIntercept::ZERO
        }
        None => {
            warn!("Could not interpret {:?} as a linear equation", equation);
            SlopeIntercept::ZERO
        }
    }
}

/// Collect every `vector X = (x, y)` definition, keyed by uppercase name.
/// A name defined twice keeps its last coordinates.
pub fn parse_vectors(text: &str) -> BTreeMap<char, VectorPoint> {
    let mut vectors = BTreeMap::new();

    for caps in vector_definition().captures_iter(text) {
        let Some(name) = caps[1].chars().next() else {
            continue;
        };
        let (Ok(x), Ok(y)) = (caps[2].parse::<i64>(), caps[3].parse::<i64>()) else {
            warn!("Skipping vector {} with out-of-range coordinates", name);
            continue;
        };
        vectors.insert(name.to_ascii_uppercase(), VectorPoint { x, y });
    }

    vectors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_can_plot_linear_equation() {
        assert!(can_plot("2x+3y=6"));
        assert!(can_plot("consider 2X - Y = 4"));
    }

    #[test]
    fn test_can_plot_rejects_plain_text() {
        assert!(!can_plot("hello world"));
    }

    #[test]
    fn test_can_plot_other_triggers() {
        assert!(can_plot(r"\begin{bmatrix} 1 \end{bmatrix}"));
        assert!(can_plot("Vector A = (1, -2)"));
        assert!(can_plot("what is vector a + vector b?"));
        assert!(can_plot("Let's graph it"));
    }

    #[test]
    fn test_extract_orders_equations_before_vectors() {
        let found = extract_equations("vector B = (0, 1) then 2x+3y=6 and vector A = (1, 2)");
        assert_eq!(
            found,
            vec![
                "2x+3y=6".to_string(),
                "vector B = (0, 1)".to_string(),
                "vector A = (1, 2)".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_equation_then_vector() {
        assert_eq!(
            extract_equations("2x+3y=6 and vector A = (1, 2)"),
            vec!["2x+3y=6".to_string(), "vector A = (1, 2)".to_string()]
        );
    }

    #[test]
    fn test_extract_is_case_sensitive_for_equations() {
        assert!(extract_equations("2X+3Y=6").is_empty());
        assert_eq!(extract_equations("VECTOR c = (3, 4)"), vec!["VECTOR c = (3, 4)"]);
    }

    #[test]
    fn test_extract_nothing() {
        assert!(extract_equations("no math here").is_empty());
    }

    #[test]
    fn test_slope_intercept_basic() {
        let si = slope_intercept("2x+3y=6");
        assert_close(si.slope, -2.0 / 3.0);
        assert_close(si.intercept, 2.0);
    }

    #[test]
    fn test_slope_intercept_bare_coefficients() {
        let si = slope_intercept("x+y=0");
        assert_close(si.slope, -1.0);
        assert_close(si.intercept, 0.0);
    }

    #[test]
    fn test_slope_intercept_signs_and_spaces() {
        let si = slope_intercept("-x - 2y = 4");
        assert_close(si.slope, -0.5);
        assert_close(si.intercept, -2.0);
    }

    #[test]
    fn test_slope_intercept_zero_b_falls_back() {
        assert_eq!(slope_intercept("3x+0y=6"), SlopeIntercept::ZERO);
    }

    #[test]
    fn test_slope_intercept_no_match_falls_back() {
        assert_eq!(slope_intercept("y = 2x + 1"), SlopeIntercept::ZERO);
    }

    #[test]
    fn test_parse_vectors_last_write_wins() {
        let vectors = parse_vectors("vector A = (1, 2) vector A = (3, 4)");
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[&'A'], VectorPoint { x: 3, y: 4 });
    }

    #[test]
    fn test_parse_vectors_uppercases_names() {
        let vectors = parse_vectors("vector b = (-1, 5) and Vector c=(2,-3)");
        assert_eq!(vectors[&'B'], VectorPoint { x: -1, y: 5 });
        assert_eq!(vectors[&'C'], VectorPoint { x: 2, y: -3 });
    }

    #[test]
    fn test_parse_vectors_malformed_is_empty() {
        assert!(parse_vectors("vector A = (1; 2)").is_empty());
        assert!(parse_vectors("vector A = (99999999999999999999, 1)").is_empty());
    }

    #[test]
    fn test_is_vector_set() {
        assert!(is_vector_set(&["Vector A = (1, 2)".to_string()]));
        assert!(!is_vector_set(&["2x+3y=6".to_string()]));
    }
}
