// src/plot_functions/plot_variable.rs

use std::path::Path;

use ndarray::{ArrayView1, Axis, Ix1, Ix2};

use crate::plot_framework::{
    calculate_range, draw_line_chart, finite_y_bounds, series_color, LineChartConfig, PlotSeries,
    RenderConfig, RenderError,
};
use crate::types::{NumericArray, SeriesPoints};

fn indexed(values: ArrayView1<f64>) -> SeriesPoints {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

/// Sample-index series for a rank-1 or rank-2 variable.
/// Vectors give one line named after the variable; matrices one line per
/// column, named `name[:, c]`.
pub fn variable_series(
    name: &str,
    array: &NumericArray,
    stroke_width: u32,
) -> Result<Vec<PlotSeries>, RenderError> {
    if let Ok(vector) = array.view().into_dimensionality::<Ix1>() {
        return Ok(vec![PlotSeries {
            data: indexed(vector),
            label: name.to_string(),
            color: series_color(0),
            stroke_width,
        }]);
    }
    if let Ok(matrix) = array.view().into_dimensionality::<Ix2>() {
        return Ok(matrix
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(c, column)| PlotSeries {
                data: indexed(column),
                label: format!("{name}[:, {c}]"),
                color: series_color(c),
                stroke_width,
            })
            .collect());
    }
    Err(RenderError::UnsupportedRank(array.ndim()))
}

/// Plots one variable against its sample index.
pub fn plot_variable(
    name: &str,
    array: &NumericArray,
    output_path: &Path,
    render: &RenderConfig,
) -> Result<(), RenderError> {
    let series = variable_series(name, array, render.scaled_line_width())?;
    let samples = series.iter().map(|s| s.data.len()).max().unwrap_or(0);
    if samples == 0 {
        return Err(RenderError::NoData);
    }
    let (val_min, val_max) = finite_y_bounds(&series).ok_or(RenderError::NoData)?;
    let (y_lo, y_hi) = calculate_range(val_min, val_max);
    // A single sample still gets a drawable x span.
    let x_max = (samples - 1).max(1) as f64;

    let chart = LineChartConfig {
        title: render.title.clone(),
        x_label: render.x_label.clone(),
        y_label: render.y_label.clone(),
        x_range: 0.0..x_max,
        y_range: render.y_limits.apply(y_lo..y_hi),
        series,
    };
    draw_line_chart(output_path, &chart, render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, array};

    #[test]
    fn test_vector_is_one_indexed_series() {
        let series = variable_series("v", &array![3.0, 4.0].into_dyn(), 1).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "v");
        assert_eq!(series[0].data, vec![(0.0, 3.0), (1.0, 4.0)]);
    }

    #[test]
    fn test_matrix_plots_each_column() {
        let m = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]].into_dyn();
        let series = variable_series("m", &m, 1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].label, "m[:, 1]");
        assert_eq!(series[1].data, vec![(0.0, 10.0), (1.0, 20.0), (2.0, 30.0)]);
    }

    #[test]
    fn test_scalar_and_cube_are_rejected() {
        assert!(matches!(
            variable_series("s", &arr0(1.0).into_dyn(), 1),
            Err(RenderError::UnsupportedRank(0))
        ));
        let cube = ndarray::Array3::<f64>::zeros((2, 2, 2)).into_dyn();
        assert!(matches!(
            variable_series("c", &cube, 1),
            Err(RenderError::UnsupportedRank(3))
        ));
    }
}

// src/plot_functions/plot_variable.rs
