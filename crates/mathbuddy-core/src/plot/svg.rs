use std::fmt::Write;

use super::{Bounds, LinePlot, Plot, VectorPlot, GRID_COLOR, REFERENCE_COLOR, VECTOR_LINE_COLOR, VECTOR_POINT_COLOR};

const MARGIN: f64 = 40.0;
const LEGEND_ROW: f64 = 18.0;
const TICKS: usize = 10;
const CLIP_ID: &str = "plot-area";

#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            background: "#1A1A1A".to_string(),
            text_color: "#DDDDDD".to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
        }
    }
}

/// Maps plot coordinates onto the drawing area.
struct Frame {
    bounds: Bounds,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn x(&self, x: f64) -> f64 {
        let [lo, hi] = self.bounds.x;
        self.left + (x - lo) / (hi - lo) * self.width
    }

    fn y(&self, y: f64) -> f64 {
        let [lo, hi] = self.bounds.y;
        self.top + (hi - y) / (hi - lo) * self.height
    }
}

/// Render a plot as a standalone SVG document.
pub fn render_svg(plot: &Plot, options: &SvgOptions) -> String {
    let legend_rows = match plot {
        Plot::Lines(p) => p.series.len(),
        Plot::Vectors(_) => 0,
    };
    let legend_height = legend_rows as f64 * LEGEND_ROW;

    let frame = Frame {
        bounds: plot.bounds(),
        left: MARGIN,
        top: MARGIN / 2.0,
        width: (options.width - MARGIN * 1.5).max(1.0),
        height: (options.height - MARGIN * 1.5 - legend_height).max(1.0),
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = options.width,
        h = options.height
    );
    let _ = write!(
        svg,
        "<defs><clipPath id=\"{}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/></clipPath></defs>",
        CLIP_ID,
        frame.left,
        frame.top,
        frame.width,
        frame.height
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&options.background)
    );

    write_grid(&mut svg, &frame, options);

    for ((x1, y1), (x2, y2)) in frame.bounds.reference_lines() {
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            frame.x(x1),
            frame.y(y1),
            frame.x(x2),
            frame.y(y2),
            REFERENCE_COLOR.hex()
        );
    }

    match plot {
        Plot::Lines(p) => write_lines(&mut svg, &frame, p, options),
        Plot::Vectors(p) => write_vectors(&mut svg, &frame, p, options),
    }

    svg.push_str("</svg>");
    svg
}

fn write_grid(svg: &mut String, frame: &Frame, options: &SvgOptions) {
    let [x_lo, x_hi] = frame.bounds.x;
    let [y_lo, y_hi] = frame.bounds.y;

    for i in 0..=TICKS {
        let t = i as f64 / TICKS as f64;
        let gx = x_lo + (x_hi - x_lo) * t;
        let gy = y_lo + (y_hi - y_lo) * t;

        let _ = write!(
            svg,
            "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"{c}\" stroke-dasharray=\"3 3\"/>",
            frame.top,
            frame.top + frame.height,
            x = frame.x(gx),
            c = GRID_COLOR.hex()
        );
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{c}\" stroke-dasharray=\"3 3\"/>",
            frame.left,
            frame.left + frame.width,
            y = frame.y(gy),
            c = GRID_COLOR.hex()
        );

        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" {}>{}</text>",
            frame.x(gx),
            frame.top + frame.height + options.font_size + 4.0,
            text_attrs(options),
            tick_label(gx)
        );
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\" {}>{}</text>",
            frame.left - 6.0,
            frame.y(gy) + options.font_size / 3.0,
            text_attrs(options),
            tick_label(gy)
        );
    }
}

fn write_lines(svg: &mut String, frame: &Frame, plot: &LinePlot, options: &SvgOptions) {
    // Every sample is kept; the clip path trims steep lines at the frame edge
    let _ = write!(svg, "<g clip-path=\"url(#{})\">", CLIP_ID);
    for series in &plot.series {
        let points: Vec<String> = series
            .points
            .iter()
            .map(|&(x, y)| format!("{:.2},{:.2}", frame.x(x), frame.y(y)))
            .collect();
        let _ = write!(
            svg,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
            points.join(" "),
            series.color.hex()
        );
    }
    svg.push_str("</g>");

    let legend_top = frame.top + frame.height + options.font_size + 16.0;
    for (i, series) in plot.series.iter().enumerate() {
        let y = legend_top + i as f64 * LEGEND_ROW;
        let _ = write!(
            svg,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"12\" height=\"3\" fill=\"{}\"/>",
            frame.left,
            y - 4.0,
            series.color.hex()
        );
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" {}>{}</text>",
            frame.left + 18.0,
            y,
            text_attrs(options),
            escape_xml(&series.label)
        );
    }
}

fn write_vectors(svg: &mut String, frame: &Frame, plot: &VectorPlot, options: &SvgOptions) {
    let (ox, oy) = (frame.x(0.0), frame.y(0.0));

    for v in plot.vectors() {
        let _ = write!(
            svg,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            ox,
            oy,
            frame.x(v.x),
            frame.y(v.y),
            VECTOR_LINE_COLOR.hex()
        );
    }

    for p in &plot.points {
        let (px, py) = (frame.x(p.x), frame.y(p.y));
        let _ = write!(
            svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"5\" fill=\"{}\"/>",
            px,
            py,
            VECTOR_POINT_COLOR.hex()
        );
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" {}>{}</text>",
            px + 5.0,
            py - 5.0,
            text_attrs(options),
            escape_xml(&p.name)
        );
    }
}

fn text_attrs(options: &SvgOptions) -> String {
    format!(
        "font-family=\"{}\" font-size=\"{}\" fill=\"{}\"",
        escape_xml(&options.font_family),
        options.font_size,
        escape_xml(&options.text_color)
    )
}

fn tick_label(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
