// src/plot_functions/plot_states.rs

use std::path::Path;

use ndarray_stats::QuantileExt;

use crate::data_analysis::selection::PlotRequest;
use crate::plot_framework::{
    calculate_range, draw_line_chart, finite_y_bounds, series_color, LineChartConfig, PlotSeries,
    RenderConfig, RenderError,
};

/// One line per selected state, colored by its position in the state block
/// so a series keeps its color whatever else is selected.
pub fn state_series(request: &PlotRequest, stroke_width: u32) -> Vec<PlotSeries> {
    request
        .selected
        .iter()
        .map(|&i| PlotSeries {
            data: request
                .time
                .iter()
                .zip(request.states.row(i).iter())
                .map(|(&t, &y)| (t, y))
                .collect(),
            label: request.label_for(i),
            color: series_color(i),
            stroke_width,
        })
        .collect()
}

/// Generates the state-over-time chart for one resolved file.
pub fn plot_states(
    request: &PlotRequest,
    output_path: &Path,
    render: &RenderConfig,
) -> Result<(), RenderError> {
    let series = state_series(request, render.scaled_line_width());

    let (time_min, time_max) = match (request.time.min(), request.time.max()) {
        (Ok(lo), Ok(hi)) => (*lo, *hi),
        _ => return Err(RenderError::NoData),
    };
    let (val_min, val_max) = finite_y_bounds(&series).ok_or(RenderError::NoData)?;
    let (y_lo, y_hi) = calculate_range(val_min, val_max);

    let chart = LineChartConfig {
        title: render.title.clone(),
        x_label: render.x_label.clone(),
        y_label: render.y_label.clone(),
        x_range: time_min..time_max,
        y_range: render.y_limits.apply(y_lo..y_hi),
        series,
    };
    draw_line_chart(output_path, &chart, render)
}

/// Prints a per-series min/max table for the selected states.
pub fn print_series_summary(request: &PlotRequest, source: &str) {
    let first = request.time.first().copied().unwrap_or(f64::NAN);
    let last = request.time.last().copied().unwrap_or(f64::NAN);
    println!(
        "{source}: {} samples, t = [{first:.3}, {last:.3}]",
        request.sample_count()
    );
    for &i in &request.selected {
        let row = request.states.row(i);
        println!(
            "  {:<16} min {:>12.5}  max {:>12.5}",
            request.label_for(i),
            row.min_skipnan(),
            row.max_skipnan()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    fn request() -> PlotRequest {
        let time = Array1::linspace(0.0, 1.0, 5);
        let states = Array2::from_shape_fn((3, 5), |(r, c)| (r * 10 + c) as f64);
        PlotRequest::new(
            time,
            states,
            vec!["a".into(), "b".into(), "c".into()],
            vec![0, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_state_series_uses_selected_rows() {
        let series = state_series(&request(), 2);
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "c");
        assert_eq!(series[1].data[0], (0.0, 20.0));
        assert_eq!(series[1].data[4], (1.0, 24.0));
        assert_eq!(series[1].color, series_color(2));
    }

    #[test]
    fn test_plot_states_rejects_all_nan_data() {
        let req = PlotRequest::new(
            array![0.0, 1.0],
            array![[f64::NAN, f64::NAN]],
            vec!["x".into()],
            vec![],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = plot_states(&req, &dir.path().join("nan.png"), &RenderConfig::default());
        assert!(matches!(result, Err(RenderError::NoData)));
    }
}

// src/plot_functions/plot_states.rs
