//! Static Chart Renderer
//! Generates the yearly trend PNG with plotters.
//!
//! Layout:
//! 1. Title: "Population Trends for {label}"
//! 2. Line of yearly Sum with optional markers
//! 3. Optional shaded 95% confidence band around the line
//! 4. Legend in the upper right

use crate::stats::{YearlyAggregate, YearlySeries};
use log::{info, warn};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Confidence level of the shaded band.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

const DEFAULT_COLOR: RGBColor = RGBColor(255, 165, 0); // Orange
const MARKER_SIZE: i32 = 4;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to plot: the filtered series is empty")]
    EmptySeries,
    #[error("Cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

/// Plot appearance, read from the `plot_style` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Image size in pixels, `[width, height]`.
    pub figure_size: [u32; 2],
    /// Named colour or `#rrggbb`.
    pub line_color: String,
    /// `o`, `s`, `^`, `x` or `none`.
    pub marker: String,
    pub grid: bool,
    pub confidence_band: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            figure_size: [1000, 600],
            line_color: "orange".to_string(),
            marker: "o".to_string(),
            grid: true,
            confidence_band: true,
        }
    }
}

/// Point marker drawn at every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerGlyph {
    Circle,
    Square,
    Triangle,
    Cross,
    None,
}

impl MarkerGlyph {
    /// Parse a matplotlib-style marker code; unknown codes fall back to a circle.
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "o" | "circle" => MarkerGlyph::Circle,
            "s" | "square" => MarkerGlyph::Square,
            "^" | "triangle" => MarkerGlyph::Triangle,
            "x" | "+" | "cross" => MarkerGlyph::Cross,
            "" | "none" | "None" => MarkerGlyph::None,
            other => {
                warn!("Unknown marker {:?}, using circle", other);
                MarkerGlyph::Circle
            }
        }
    }
}

/// Parse a colour name or `#rrggbb` hex string.
pub fn parse_color(spec: &str) -> Option<RGBColor> {
    let spec = spec.trim();
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }

    let rgb = match spec.to_ascii_lowercase().as_str() {
        "orange" => (255, 165, 0),
        "blue" => (31, 119, 180),
        "red" => (214, 39, 40),
        "green" => (44, 160, 44),
        "purple" => (148, 103, 189),
        "brown" => (140, 86, 75),
        "pink" => (227, 119, 194),
        "gray" | "grey" => (127, 127, 127),
        "olive" => (188, 189, 34),
        "cyan" => (23, 190, 207),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "black" => (0, 0, 0),
        _ => return None,
    };
    Some(RGBColor(rgb.0, rgb.1, rgb.2))
}

/// Two-sided normal quantile for `level`, e.g. ~1.96 for 0.95.
pub fn z_value(level: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(dist) => dist.inverse_cdf(0.5 + level / 2.0),
        Err(_) => f64::NAN,
    }
}

/// Half width of the band around a year's Sum: `z * std / sqrt(count)`.
///
/// Years where this is undefined (fewer than two values) get zero width.
pub fn band_half_width(point: &YearlyAggregate, z: f64) -> f64 {
    if point.count == 0 {
        return 0.0;
    }
    let half = z * point.std_dev / (point.count as f64).sqrt();
    if half.is_finite() {
        half
    } else {
        0.0
    }
}

/// Renders trend charts to PNG files.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render Sum over Year for `series` into `path`.
    pub fn render_trend(
        series: &YearlySeries,
        style: &PlotStyle,
        path: &Path,
    ) -> Result<(), RenderError> {
        if series.is_empty() {
            return Err(RenderError::EmptySeries);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(RenderError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "output directory does not exist",
                    ),
                });
            }
        }

        Self::draw(series, style, path).map_err(|e| RenderError::Draw(e.to_string()))?;
        info!("Saved trend plot to {}", path.display());
        Ok(())
    }

    fn get_x_range(series: &YearlySeries) -> (f64, f64) {
        let (first, last) = series.year_span().unwrap_or((0, 1));
        if first == last {
            (first as f64 - 1.0, last as f64 + 1.0)
        } else {
            (first as f64, last as f64)
        }
    }

    fn get_y_range(series: &YearlySeries, z: Option<f64>) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for p in &series.points {
            let half = z.map(|z| band_half_width(p, z)).unwrap_or(0.0);
            min = min.min(p.sum - half);
            max = max.max(p.sum + half);
        }
        if !min.is_finite() || !max.is_finite() {
            return (0.0, 1.0);
        }
        let pad = if max > min {
            (max - min) * 0.05
        } else {
            (max.abs() * 0.1).max(1.0)
        };
        (min - pad, max + pad)
    }

    fn draw(
        series: &YearlySeries,
        style: &PlotStyle,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let color = parse_color(&style.line_color).unwrap_or_else(|| {
            warn!("Unknown line colour {:?}, using orange", style.line_color);
            DEFAULT_COLOR
        });
        let marker = MarkerGlyph::parse(&style.marker);
        let z = style.confidence_band.then(|| z_value(CONFIDENCE_LEVEL));

        let [width, height] = style.figure_size;
        let root = BitMapBackend::new(path, (width.max(200), height.max(150))).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_min, x_max) = Self::get_x_range(series);
        let (y_min, y_max) = Self::get_y_range(series, z);

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Population Trends for {}", series.label),
                ("sans-serif", 24),
            )
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let year_fmt = |x: &f64| format!("{:.0}", x);
        let mut mesh = chart.configure_mesh();
        mesh.x_desc("Year")
            .y_desc("Population (Tonnes)")
            .x_label_formatter(&year_fmt);
        if !style.grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;

        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|p| (p.year as f64, p.sum))
            .collect();

        if let Some(z) = z {
            // upper edge left to right, lower edge right to left
            let mut band: Vec<(f64, f64)> = series
                .points
                .iter()
                .map(|p| (p.year as f64, p.sum + band_half_width(p, z)))
                .collect();
            band.extend(
                series
                    .points
                    .iter()
                    .rev()
                    .map(|p| (p.year as f64, p.sum - band_half_width(p, z))),
            );

            chart
                .draw_series(std::iter::once(Polygon::new(band, color.mix(0.2).filled())))?
                .label("95% confidence band")
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.2).filled())
                });
        }

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        match marker {
            MarkerGlyph::Circle => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, MARKER_SIZE, color.filled())),
                )?;
            }
            MarkerGlyph::Square => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new(
                            [(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)],
                            color.filled(),
                        )
                }))?;
            }
            MarkerGlyph::Triangle => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| TriangleMarker::new(p, MARKER_SIZE + 1, color.filled())),
                )?;
            }
            MarkerGlyph::Cross => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| Cross::new(p, MARKER_SIZE, color.stroke_width(2))),
                )?;
            }
            MarkerGlyph::None => {}
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}
