// src/plot_framework.rs

use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use log::warn;
use plotters::backend::BitMapBackend;
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::drawing::IntoDrawingArea;
use plotters::element::PathElement;
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, WHITE};
use plotters::style::{Color, RGBColor};

use crate::constants::{
    DEFAULT_DPI, DEFAULT_FIGSIZE_IN, DEFAULT_X_LABEL, DEFAULT_Y_LABEL, GRID_ALPHA_BOLD,
    GRID_ALPHA_LIGHT, LEGEND_BACKGROUND_ALPHA, LINE_WIDTH_LEGEND, LINE_WIDTH_PLOT,
    MAX_PLOT_PIXELS, MIN_PLOT_PIXELS, RANGE_PADDING_FLAT, RANGE_PADDING_FRACTION, SERIES_COLORS,
};
use crate::font_config::ChartFonts;
use crate::font_safe_backend::FontSafeBackend;
use crate::types::SeriesPoints;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to draw")]
    NoData,
    #[error("cannot plot a rank-{0} array")]
    UnsupportedRank(usize),
    #[error("invalid axis range {start}..{end}")]
    InvalidRange { start: f64, end: f64 },
    #[error("drawing failed: {0}")]
    Drawing(String),
}

fn drawing<E: Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Calculate plot range with padding.
/// Adds 5% padding, or a fixed padding for flat data.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 {
        RANGE_PADDING_FLAT
    } else {
        range * RANGE_PADDING_FRACTION
    };
    (min - padding, max + padding)
}

/// Min and max over the finite values of all points' y coordinates.
pub fn finite_y_bounds<'a, I>(series: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a PlotSeries>,
{
    series
        .into_iter()
        .flat_map(|s| s.data.iter().map(|&(_, y)| y))
        .filter(|y| y.is_finite())
        .fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
}

/// Cycles through the tab10 palette.
pub fn series_color(index: usize) -> RGBColor {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

#[derive(Clone)]
pub struct PlotSeries {
    pub data: SeriesPoints,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
}

/// User-requested y-axis limits. Unset bounds keep the auto-computed value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YLimits {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl YLimits {
    /// `yabs` gives symmetric limits and overrides `ymin`/`ymax`.
    pub fn from_bounds(ymin: Option<f64>, ymax: Option<f64>, yabs: Option<f64>) -> Self {
        match yabs {
            Some(a) => Self {
                min: Some(-a.abs()),
                max: Some(a.abs()),
            },
            None => Self {
                min: ymin,
                max: ymax,
            },
        }
    }

    /// Merges the limits into an auto range.
    ///
    /// A single bound that crosses the opposite auto bound is kept and the
    /// auto side is moved past it by the auto span. Any other non-finite or
    /// empty result is rejected with a warning and the auto range is kept.
    pub fn apply(&self, auto: Range<f64>) -> Range<f64> {
        let span = auto.end - auto.start;
        let span = if span.is_finite() && span > 0.0 {
            span
        } else {
            RANGE_PADDING_FLAT
        };
        let (start, end) = match (self.min, self.max) {
            (Some(lo), None) if lo >= auto.end => (lo, lo + span),
            (None, Some(hi)) if hi <= auto.start => (hi - span, hi),
            (lo, hi) => (lo.unwrap_or(auto.start), hi.unwrap_or(auto.end)),
        };
        if start.is_finite() && end.is_finite() && start < end {
            start..end
        } else {
            warn!(
                "Ignoring y-limits {start}..{end}; using automatic range {}..{}",
                auto.start, auto.end
            );
            auto
        }
    }
}

/// Rendering options passed explicitly to every plot call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Figure size in inches (width, height).
    pub figsize: (f64, f64),
    pub dpi: u32,
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
    pub y_limits: YLimits,
    /// Line width at 100 DPI; scaled with `dpi`.
    pub line_width: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            figsize: DEFAULT_FIGSIZE_IN,
            dpi: DEFAULT_DPI,
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            title: None,
            y_limits: YLimits::default(),
            line_width: LINE_WIDTH_PLOT,
        }
    }
}

impl RenderConfig {
    /// Pixel dimensions: inches x DPI, clamped to a sane bitmap size.
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| {
            let raw = (inches * self.dpi as f64).round();
            if raw.is_finite() {
                raw.clamp(MIN_PLOT_PIXELS as f64, MAX_PLOT_PIXELS as f64) as u32
            } else {
                MIN_PLOT_PIXELS
            }
        };
        (px(self.figsize.0), px(self.figsize.1))
    }

    pub fn scaled_line_width(&self) -> u32 {
        scale_width(self.line_width, self.dpi)
    }
}

fn scale_width(width: u32, dpi: u32) -> u32 {
    ((width as f64 * dpi as f64 / 100.0).round() as u32).max(1)
}

/// One chart: ranges, descriptions and the lines to draw.
#[derive(Clone)]
pub struct LineChartConfig {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub series: Vec<PlotSeries>,
}

/// Draws a single line chart with grid and upper-left legend to a PNG file.
pub fn draw_line_chart(
    output_path: &Path,
    chart_config: &LineChartConfig,
    render: &RenderConfig,
) -> Result<(), RenderError> {
    if chart_config.series.iter().all(|s| s.data.is_empty()) {
        return Err(RenderError::NoData);
    }
    for range in [&chart_config.x_range, &chart_config.y_range] {
        if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
            return Err(RenderError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
    }

    let fonts = ChartFonts::for_dpi(render.dpi);
    let (width, height) = render.pixel_size();
    let label_area = (fonts.tick_label.1 * 2.0 + fonts.axis_desc.1 * 1.5).ceil() as u32;
    let y_label_area = label_area + (fonts.tick_label.1 * 2.5).ceil() as u32;

    let root = FontSafeBackend::new(BitMapBackend::new(output_path, (width, height)))
        .into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin((fonts.tick_label.1 * 1.2).ceil() as u32)
        .x_label_area_size(label_area)
        .y_label_area_size(y_label_area);
    if let Some(title) = &chart_config.title {
        builder.caption(title, fonts.title);
    }
    let mut chart = builder
        .build_cartesian_2d(chart_config.x_range.clone(), chart_config.y_range.clone())
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc(chart_config.x_label.as_str())
        .y_desc(chart_config.y_label.as_str())
        .x_labels(10)
        .y_labels(8)
        .bold_line_style(BLACK.mix(GRID_ALPHA_BOLD))
        .light_line_style(BLACK.mix(GRID_ALPHA_LIGHT))
        .label_style(fonts.tick_label)
        .axis_desc_style(fonts.axis_desc)
        .draw()
        .map_err(drawing)?;

    let legend_width = scale_width(LINE_WIDTH_LEGEND, render.dpi);
    let legend_len = (fonts.legend.1 * 1.8).ceil() as i32;
    let mut legend_series_count = 0;
    for s in &chart_config.series {
        if s.data.is_empty() {
            continue;
        }
        let color = s.color;
        let series = chart
            .draw_series(LineSeries::new(
                s.data.iter().copied(),
                color.stroke_width(s.stroke_width),
            ))
            .map_err(drawing)?;
        if !s.label.is_empty() {
            series.label(s.label.as_str()).legend(move |(x, y)| {
                PathElement::new(
                    vec![(x, y), (x + legend_len, y)],
                    color.stroke_width(legend_width),
                )
            });
            legend_series_count += 1;
        }
    }

    if legend_series_count > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(LEGEND_BACKGROUND_ALPHA))
            .border_style(BLACK)
            .label_font(fonts.legend)
            .draw()
            .map_err(drawing)?;
    }

    root.present().map_err(drawing)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_range_pads_and_orders() {
        let (lo, hi) = calculate_range(10.0, 0.0);
        assert!((lo - -0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_range_flat_data() {
        assert_eq!(calculate_range(2.0, 2.0), (1.5, 2.5));
    }

    #[test]
    fn test_yabs_overrides_independent_bounds() {
        let limits = YLimits::from_bounds(Some(-10.0), Some(3.0), Some(-0.5));
        assert_eq!(limits.min, Some(-0.5));
        assert_eq!(limits.max, Some(0.5));
    }

    #[test]
    fn test_single_bound_keeps_auto_other_side() {
        let limits = YLimits::from_bounds(None, Some(4.0), None);
        assert_eq!(limits.apply(-1.0..2.0), -1.0..4.0);
        let limits = YLimits::from_bounds(Some(0.0), None, None);
        assert_eq!(limits.apply(-1.0..2.0), 0.0..2.0);
    }

    #[test]
    fn test_single_bound_past_auto_range_is_kept() {
        let limits = YLimits::from_bounds(Some(3.0), None, None);
        assert_eq!(limits.apply(-1.0..2.0), 3.0..6.0);
        let limits = YLimits::from_bounds(None, Some(-2.0), None);
        assert_eq!(limits.apply(-1.0..2.0), -5.0..-2.0);
        let limits = YLimits::from_bounds(None, Some(f64::NAN), None);
        assert_eq!(limits.apply(-1.0..2.0), -1.0..2.0);
    }

    #[test]
    fn test_inverted_limits_fall_back_to_auto() {
        let limits = YLimits::from_bounds(Some(5.0), Some(1.0), None);
        assert_eq!(limits.apply(-1.0..2.0), -1.0..2.0);
        let limits = YLimits::from_bounds(None, None, Some(0.0));
        assert_eq!(limits.apply(-1.0..2.0), -1.0..2.0);
    }

    #[test]
    fn test_pixel_size_is_inches_times_dpi() {
        let config = RenderConfig::default();
        assert_eq!(config.pixel_size(), (2100, 900));
        let tiny = RenderConfig {
            figsize: (0.1, f64::NAN),
            dpi: 10,
            ..RenderConfig::default()
        };
        assert_eq!(tiny.pixel_size(), (MIN_PLOT_PIXELS, MIN_PLOT_PIXELS));
    }

    #[test]
    fn test_finite_y_bounds_skips_nan() {
        let series = vec![PlotSeries {
            data: vec![(0.0, 1.0), (1.0, f64::NAN), (2.0, -3.0)],
            label: "a".into(),
            color: series_color(0),
            stroke_width: 1,
        }];
        assert_eq!(finite_y_bounds(&series), Some((-3.0, 1.0)));
    }

    #[test]
    fn test_series_color_cycles() {
        assert_eq!(series_color(0), series_color(SERIES_COLORS.len()));
    }

    #[test]
    fn test_draw_line_chart_rejects_empty_range() {
        let dir = tempfile::tempdir().unwrap();
        let config = LineChartConfig {
            title: None,
            x_label: "x".into(),
            y_label: "y".into(),
            x_range: 1.0..1.0,
            y_range: 0.0..1.0,
            series: vec![PlotSeries {
                data: vec![(1.0, 0.5)],
                label: String::new(),
                color: series_color(1),
                stroke_width: 1,
            }],
        };
        let result = draw_line_chart(&dir.path().join("x.png"), &config, &RenderConfig::default());
        assert!(matches!(result, Err(RenderError::InvalidRange { .. })));
    }
}

// src/plot_framework.rs
