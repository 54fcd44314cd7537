//! Plot model for equations found in tutor replies.
//!
//! Sampling and layout only. Drawing happens elsewhere: [`svg`] writes a
//! standalone document and the terminal UI draws the same model with its own
//! widgets.

pub mod svg;

pub use svg::{render_svg, SvgOptions};

use crate::equations::{
    can_plot, extract_equations, is_vector_set, parse_vectors, slope_intercept, SlopeIntercept,
};

/// Lowest and highest x sampled for every line.
pub const SAMPLE_RANGE: (i32, i32) = (-10, 10);

/// Vector axes never shrink below this half-width.
pub const MIN_VECTOR_EXTENT: f64 = 5.0;

/// Series colors, assigned round-robin.
pub const PALETTE: [Rgb; 5] = [
    Rgb(0x4B, 0x72, 0x89),
    Rgb(0x7E, 0x69, 0xAB),
    Rgb(0x6E, 0x59, 0xA5),
    Rgb(0x9b, 0x87, 0xf5),
    Rgb(0xD6, 0xBC, 0xFA),
];

pub const VECTOR_POINT_COLOR: Rgb = Rgb(0x9b, 0x87, 0xf5);
pub const VECTOR_LINE_COLOR: Rgb = Rgb(0x7E, 0x69, 0xAB);
pub const REFERENCE_COLOR: Rgb = Rgb(0x66, 0x66, 0x66);
pub const GRID_COLOR: Rgb = Rgb(0x44, 0x44, 0x44);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Axis ranges, `[min, max]` for each dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Bounds {
    fn symmetric(half_x: f64, half_y: f64) -> Self {
        Self {
            x: [-half_x, half_x],
            y: [-half_y, half_y],
        }
    }

    /// The x = 0 and y = 0 reference lines, as `(from, to)` segments.
    pub fn reference_lines(&self) -> [((f64, f64), (f64, f64)); 2] {
        [
            ((0.0, self.y[0]), (0.0, self.y[1])),
            ((self.x[0], 0.0), (self.x[1], 0.0)),
        ]
    }
}

/// One sampled linear equation.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub line: SlopeIntercept,
    pub color: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    pub series: Vec<LineSeries>,
    pub bounds: Bounds,
}

impl LinePlot {
    pub fn new(equations: &[String]) -> Self {
        let series = equations
            .iter()
            .enumerate()
            .map(|(i, equation)| {
                let line = slope_intercept(equation);
                let compact: String = equation.split_whitespace().collect();
                LineSeries {
                    label: format!("Equation {}: {}", i + 1, compact),
                    line,
                    color: PALETTE[i % PALETTE.len()],
                    points: sample(line),
                }
            })
            .collect();

        let (lo, hi) = SAMPLE_RANGE;
        let extent = lo.abs().max(hi) as f64;

        Self {
            series,
            bounds: Bounds::symmetric(extent, extent),
        }
    }
}

fn sample(line: SlopeIntercept) -> Vec<(f64, f64)> {
    let (lo, hi) = SAMPLE_RANGE;
    (lo..=hi)
        .map(|x| {
            let x = x as f64;
            (x, line.y_at(x))
        })
        .collect()
}

/// A named point; the origin is `O`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorPlot {
    /// Origin first, then each vector in name order.
    pub points: Vec<LabeledPoint>,
    pub bounds: Bounds,
}

impl VectorPlot {
    pub fn new(equations: &[String]) -> Self {
        let vectors = parse_vectors(&equations.join(" "));

        let mut points = vec![LabeledPoint {
            name: "O".to_string(),
            x: 0.0,
            y: 0.0,
        }];
        points.extend(vectors.iter().map(|(name, v)| LabeledPoint {
            name: name.to_string(),
            x: v.x as f64,
            y: v.y as f64,
        }));

        let max_x = vectors
            .values()
            .map(|v| v.x.unsigned_abs() as f64)
            .fold(MIN_VECTOR_EXTENT, f64::max);
        let max_y = vectors
            .values()
            .map(|v| v.y.unsigned_abs() as f64)
            .fold(MIN_VECTOR_EXTENT, f64::max);

        Self {
            points,
            bounds: Bounds::symmetric(max_x, max_y),
        }
    }

    /// The vectors themselves, without the origin.
    pub fn vectors(&self) -> &[LabeledPoint] {
        &self.points[1..]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    Lines(LinePlot),
    Vectors(VectorPlot),
}

impl Plot {
    /// Build a plot, choosing vector mode if any equation mentions "vector".
    pub fn from_equations(equations: &[String]) -> Self {
        if is_vector_set(equations) {
            Plot::Vectors(VectorPlot::new(equations))
        } else {
            Plot::Lines(LinePlot::new(equations))
        }
    }

    /// The plot to attach to a displayed message, if it has anything plottable.
    pub fn for_message(text: &str) -> Option<Self> {
        if !can_plot(text) {
            return None;
        }
        let equations = extract_equations(text);
        if equations.is_empty() {
            return None;
        }
        Some(Self::from_equations(&equations))
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Plot::Lines(p) => p.bounds,
            Plot::Vectors(p) => p.bounds,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Plot::Lines(_) => "Equations",
            Plot::Vectors(_) => "Vectors",
        }
    }
}
