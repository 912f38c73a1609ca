// src/data_analysis/layout.rs

use std::fmt;

use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis, Ix1, Ix2};

use crate::constants::{
    COMBINED_LAYOUT_AXIS_LENGTHS, COMBINED_LAYOUT_SUFFIX, COMBINED_LAYOUT_VARIABLE,
    DEFAULT_MIN_STATE_SERIES, MIN_TIME_SAMPLES, PITCH_ELEVATION_COLUMNS, PITCH_ELEVATION_LABELS,
    PITCH_ELEVATION_MIN_COLUMNS, PITCH_ELEVATION_SUFFIX, TIME_VARIABLE_CANDIDATES,
};
use crate::state_labels::{default_state_labels, label_series, synthetic_label};
use crate::types::{NumericArray, StateBlock, TimeSeries, VariableSet};

/// Knobs for the layout heuristics. `Default` matches the lab conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub combined_variable: String,
    /// Accepted lengths of the "1 time + K states" axis of the combined variable.
    pub combined_axis_lengths: Vec<usize>,
    pub time_candidates: Vec<String>,
    /// Minimum number of state series a separate-time matrix must have.
    pub min_state_series: usize,
    pub labels: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            combined_variable: COMBINED_LAYOUT_VARIABLE.to_string(),
            combined_axis_lengths: COMBINED_LAYOUT_AXIS_LENGTHS.to_vec(),
            time_candidates: TIME_VARIABLE_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_state_series: DEFAULT_MIN_STATE_SERIES,
            labels: default_state_labels(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    NamedCombined,
    SeparateTime,
    EmbeddedTime,
    /// Two columns of a wide matrix, against time when one aligns, else sample index.
    PitchElevation,
}

impl LayoutKind {
    pub fn name(self) -> &'static str {
        match self {
            LayoutKind::NamedCombined => "named combined",
            LayoutKind::SeparateTime => "separate time + matrix",
            LayoutKind::EmbeddedTime => "embedded-time matrix",
            LayoutKind::PitchElevation => "pitch/elevation columns",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time vector plus state block inferred from one file.
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub kind: LayoutKind,
    pub time: TimeSeries,
    /// (series, samples); `states.ncols() == time.len()`.
    pub states: StateBlock,
    pub labels: Vec<String>,
    /// Output file suffix: `states` for the combined layout,
    /// `<name>__pitch_elev` for the column fallback, else the variable name.
    pub suffix: String,
    /// `time` holds sample indices rather than a recorded time vector.
    pub index_axis: bool,
    /// Variable names the layout was read from, for diagnostics.
    pub sources: Vec<String>,
}

impl ResolvedLayout {
    pub fn series_count(&self) -> usize {
        self.states.nrows()
    }

    pub fn sample_count(&self) -> usize {
        self.time.len()
    }
}

pub type LayoutStrategy = fn(&VariableSet, &ResolverConfig) -> Option<ResolvedLayout>;

/// Strategies in priority order; the first `Some` wins.
pub const LAYOUT_STRATEGIES: [(LayoutKind, LayoutStrategy); 4] = [
    (LayoutKind::NamedCombined, resolve_named_combined),
    (LayoutKind::SeparateTime, resolve_separate_time),
    (LayoutKind::EmbeddedTime, resolve_embedded_time),
    (LayoutKind::PitchElevation, resolve_pitch_elevation),
];

pub fn resolve_layout(vars: &VariableSet, config: &ResolverConfig) -> Option<ResolvedLayout> {
    LAYOUT_STRATEGIES.iter().find_map(|(kind, strategy)| {
        let layout = strategy(vars, config);
        if layout.is_none() {
            log::trace!("Layout '{kind}' did not match");
        }
        layout
    })
}

/// At least two samples and every step strictly positive. NaN never qualifies.
pub fn is_strictly_increasing(values: ArrayView1<f64>) -> bool {
    values.len() >= MIN_TIME_SAMPLES
        && values
            .iter()
            .zip(values.iter().skip(1))
            .all(|(prev, next)| next > prev)
}

fn as_vector(array: &NumericArray) -> Option<ArrayView1<'_, f64>> {
    array.view().into_dimensionality::<Ix1>().ok()
}

fn as_matrix(array: &NumericArray) -> Option<ArrayView2<'_, f64>> {
    array.view().into_dimensionality::<Ix2>().ok()
}

/// Treats row 0 as time and the remaining rows as series.
/// Requires at least one series row and an increasing time row.
fn split_leading_row(matrix: ArrayView2<f64>) -> Option<(TimeSeries, StateBlock)> {
    if matrix.nrows() < 2 || !is_strictly_increasing(matrix.row(0)) {
        return None;
    }
    Some((
        matrix.row(0).to_owned(),
        matrix.slice(s![1.., ..]).to_owned(),
    ))
}

fn resolve_named_combined(vars: &VariableSet, config: &ResolverConfig) -> Option<ResolvedLayout> {
    let matrix = as_matrix(vars.get(&config.combined_variable)?)?;
    let (rows, cols) = matrix.dim();

    // Time along a row first, then along a column.
    for (axis_len, oriented) in [(rows, matrix), (cols, matrix.reversed_axes())] {
        if !config.combined_axis_lengths.contains(&axis_len) {
            continue;
        }
        if let Some((time, states)) = split_leading_row(oriented) {
            let labels = label_series(states.nrows(), &config.labels);
            return Some(ResolvedLayout {
                kind: LayoutKind::NamedCombined,
                time,
                states,
                labels,
                suffix: COMBINED_LAYOUT_SUFFIX.to_string(),
                index_axis: false,
                sources: vec![config.combined_variable.clone()],
            });
        }
    }
    None
}

/// First candidate name holding a strictly increasing vector.
fn find_time_vector<'a>(
    vars: &'a VariableSet,
    config: &'a ResolverConfig,
) -> Option<(&'a str, ArrayView1<'a, f64>)> {
    config.time_candidates.iter().find_map(|name| {
        let candidate = as_vector(vars.get(name)?)?;
        is_strictly_increasing(candidate).then_some((name.as_str(), candidate))
    })
}

fn resolve_separate_time(vars: &VariableSet, config: &ResolverConfig) -> Option<ResolvedLayout> {
    let (time_name, time) = find_time_vector(vars, config)?;
    let samples = time.len();
    let min_series = config.min_state_series.max(1);

    for (name, array) in vars {
        if name == time_name {
            continue;
        }
        let Some(matrix) = as_matrix(array) else {
            continue;
        };
        let (rows, cols) = matrix.dim();
        let states = if rows == samples && cols >= min_series {
            matrix.t().to_owned()
        } else if cols == samples && rows >= min_series {
            matrix.to_owned()
        } else {
            continue;
        };
        let labels = label_series(states.nrows(), &config.labels);
        return Some(ResolvedLayout {
            kind: LayoutKind::SeparateTime,
            time: time.to_owned(),
            states,
            labels,
            suffix: name.clone(),
            index_axis: false,
            sources: vec![time_name.to_string(), name.clone()],
        });
    }
    None
}

fn resolve_embedded_time(vars: &VariableSet, config: &ResolverConfig) -> Option<ResolvedLayout> {
    for (name, array) in vars {
        let Some(matrix) = as_matrix(array) else {
            continue;
        };
        for oriented in [matrix, matrix.reversed_axes()] {
            if let Some((time, states)) = split_leading_row(oriented) {
                let labels = label_series(states.nrows(), &config.labels);
                return Some(ResolvedLayout {
                    kind: LayoutKind::EmbeddedTime,
                    time,
                    states,
                    labels,
                    suffix: name.clone(),
                    index_axis: false,
                    sources: vec![name.clone()],
                });
            }
        }
    }
    None
}

/// Lowest-priority fallback for raw logs with no usable time layout.
///
/// Picks the first matrix with enough columns, preferring one whose rows
/// align with a time vector. A matrix whose columns align is transposed.
/// Without alignment the sample index stands in for time.
fn resolve_pitch_elevation(vars: &VariableSet, config: &ResolverConfig) -> Option<ResolvedLayout> {
    let time = find_time_vector(vars, config);
    let time_name = time.map(|(name, _)| name);

    let mut chosen: Option<(&String, ArrayView2<f64>)> = None;
    for (name, array) in vars {
        if Some(name.as_str()) == time_name {
            continue;
        }
        let Some(matrix) = as_matrix(array) else {
            continue;
        };
        if matrix.ncols() < PITCH_ELEVATION_MIN_COLUMNS {
            continue;
        }
        if time.is_some_and(|(_, t)| t.len() == matrix.nrows()) {
            chosen = Some((name, matrix));
            break;
        }
        if chosen.is_none() {
            chosen = Some((name, matrix));
        }
    }
    let (name, mut matrix) = chosen?;

    let aligned_time = match time {
        Some((_, t)) if t.len() == matrix.nrows() => Some(t),
        Some((_, t)) if t.len() == matrix.ncols() => {
            matrix = matrix.reversed_axes();
            Some(t)
        }
        _ => None,
    };
    let samples = matrix.nrows();
    if samples < MIN_TIME_SAMPLES {
        return None;
    }

    let (columns, labels): (Vec<usize>, Vec<String>) =
        if matrix.ncols() > PITCH_ELEVATION_COLUMNS[1] {
            (
                PITCH_ELEVATION_COLUMNS.to_vec(),
                PITCH_ELEVATION_LABELS.iter().map(|l| l.to_string()).collect(),
            )
        } else {
            let columns: Vec<usize> = (0..matrix.ncols().min(2)).collect();
            let labels = columns.iter().map(|&c| synthetic_label(c)).collect();
            (columns, labels)
        };

    let mut sources = vec![name.clone()];
    let time = match (aligned_time, time_name) {
        (Some(t), Some(time_name)) => {
            sources.insert(0, time_name.to_string());
            t.to_owned()
        }
        _ => Array1::from_iter((0..samples).map(|i| i as f64)),
    };
    Some(ResolvedLayout {
        kind: LayoutKind::PitchElevation,
        index_axis: aligned_time.is_none(),
        time,
        states: matrix.select(Axis(1), &columns).reversed_axes(),
        labels,
        suffix: format!("{name}__{PITCH_ELEVATION_SUFFIX}"),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2, Axis};

    fn ramp(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| i as f64 * 0.01))
    }

    /// (1 + states, n) with row 0 = time and row k = k * sin-ish values.
    fn combined(states: usize, n: usize) -> Array2<f64> {
        Array2::from_shape_fn((states + 1, n), |(r, c)| {
            if r == 0 {
                c as f64 * 0.01
            } else {
                (r as f64) * ((c as f64) * 0.1).sin()
            }
        })
    }

    fn set(entries: Vec<(&str, NumericArray)>) -> VariableSet {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_is_strictly_increasing() {
        assert!(is_strictly_increasing(array![0.0, 0.1, 0.2].view()));
        assert!(!is_strictly_increasing(array![0.0, 0.1, 0.1].view()));
        assert!(!is_strictly_increasing(array![0.0, -0.1].view()));
        assert!(!is_strictly_increasing(array![1.0].view()));
        assert!(!is_strictly_increasing(array![0.0, f64::NAN, 1.0].view()));
    }

    #[test]
    fn test_named_combined_row_layout() {
        let ans = combined(6, 100);
        let vars = set(vec![("ans", ans.clone().into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();

        assert_eq!(layout.kind, LayoutKind::NamedCombined);
        assert_eq!(layout.suffix, "states");
        assert_eq!(layout.states.dim(), (6, 100));
        assert_eq!(layout.labels, default_state_labels());
        assert_eq!(layout.time, ans.row(0));
        assert_eq!(layout.states.row(2), ans.row(3));
    }

    #[test]
    fn test_named_combined_column_layout_with_five_states() {
        let ans = combined(5, 40).reversed_axes();
        let vars = set(vec![("ans", ans.into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();

        assert_eq!(layout.kind, LayoutKind::NamedCombined);
        assert_eq!(layout.states.dim(), (5, 40));
        assert_eq!(layout.labels.len(), 5);
        assert_eq!(layout.labels[4], "elevation");
    }

    #[test]
    fn test_square_combined_uses_monotonic_axis() {
        // 7x7 with time down column 0 only.
        let mut ans = Array2::<f64>::zeros((7, 7));
        for i in 0..7 {
            ans[[i, 0]] = i as f64;
            ans[[0, i]] = if i == 0 { 0.0 } else { -1.0 };
        }
        let vars = set(vec![("ans", ans.into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();
        assert_eq!(layout.kind, LayoutKind::NamedCombined);
        assert_eq!(layout.time.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_separate_time_orients_samples_along_columns() {
        let t = ramp(50);
        let y = Array2::from_shape_fn((50, 3), |(r, c)| (r * c) as f64);
        let vars = set(vec![("t", t.clone().into_dyn()), ("y", y.clone().into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();

        assert_eq!(layout.kind, LayoutKind::SeparateTime);
        assert_eq!(layout.suffix, "y");
        assert_eq!(layout.states.dim(), (3, 50));
        assert_eq!(layout.states.row(2), y.column(2));
        assert_eq!(layout.time, t);
        assert_eq!(layout.sources, vec!["t", "y"]);
    }

    #[test]
    fn test_separate_time_picks_first_candidate_in_key_order() {
        let t = ramp(20);
        let vars = set(vec![
            ("time", t.into_dyn()),
            ("zeta", Array2::<f64>::zeros((2, 20)).into_dyn()),
            ("alpha", Array2::<f64>::zeros((20, 4)).into_dyn()),
        ]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();
        assert_eq!(layout.suffix, "alpha");
        assert_eq!(layout.labels.len(), 4);
    }

    #[test]
    fn test_separate_time_respects_min_series() {
        let vars = set(vec![
            ("t", ramp(20).into_dyn()),
            ("y", Array2::<f64>::zeros((20, 2)).into_dyn()),
        ]);
        let config = ResolverConfig {
            min_state_series: 3,
            ..ResolverConfig::default()
        };
        assert!(resolve_separate_time(&vars, &config).is_none());
    }

    #[test]
    fn test_decreasing_time_candidate_is_rejected() {
        let mut t = ramp(10);
        t.invert_axis(Axis(0));
        let vars = set(vec![
            ("t", t.into_dyn()),
            ("y", Array2::<f64>::ones((10, 2)).into_dyn()),
        ]);
        assert!(resolve_layout(&vars, &ResolverConfig::default()).is_none());
    }

    #[test]
    fn test_embedded_time_in_first_column() {
        let mut m = Array2::<f64>::zeros((30, 4));
        for r in 0..30 {
            m[[r, 0]] = r as f64 * 0.5;
            m[[r, 1]] = 1.0;
            m[[r, 2]] = 2.0;
            m[[r, 3]] = 3.0;
        }
        // Make the first row non-increasing so the column wins.
        m[[0, 1]] = -5.0;
        let vars = set(vec![("log", m.into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();

        assert_eq!(layout.kind, LayoutKind::EmbeddedTime);
        assert_eq!(layout.suffix, "log");
        assert_eq!(layout.states.dim(), (3, 30));
        assert_eq!(layout.labels, vec!["lambda", "lambda_dot", "pitch"]);
    }

    #[test]
    fn test_too_many_series_get_synthetic_labels() {
        let m = combined(8, 12);
        let vars = set(vec![("big", m.into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();
        assert_eq!(layout.kind, LayoutKind::EmbeddedTime);
        assert_eq!(layout.labels[0], "State 1");
        assert_eq!(layout.labels.len(), 8);
    }

    #[test]
    fn test_pitch_elevation_falls_back_to_sample_index() {
        // Wide raw log, no time vector, nothing increasing.
        let raw = Array2::from_shape_fn((25, 7), |(r, c)| ((r * 7 + c) as f64).cos());
        let vars = set(vec![("raw", raw.clone().into_dyn())]);
        let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();

        assert_eq!(layout.kind, LayoutKind::PitchElevation);
        assert!(layout.index_axis);
        assert_eq!(layout.suffix, "raw__pitch_elev");
        assert_eq!(layout.labels, vec!["pitch", "elevation"]);
        assert_eq!(layout.states.dim(), (2, 25));
        assert_eq!(layout.states.row(0), raw.column(2));
        assert_eq!(layout.states.row(1), raw.column(4));
        assert_eq!(layout.time[24], 24.0);
    }

    #[test]
    fn test_pitch_elevation_uses_time_aligned_with_columns() {
        // Samples run along columns, so the matrix is transposed before picking.
        let mut raw = Array2::from_shape_fn((8, 6), |(r, c)| ((r + 3 * c) as f64).sin());
        raw[[0, 0]] = 100.0;
        let config = ResolverConfig {
            min_state_series: 10,
            ..ResolverConfig::default()
        };
        let vars = set(vec![("t", ramp(6).into_dyn()), ("raw", raw.clone().into_dyn())]);
        let layout = resolve_layout(&vars, &config).unwrap();

        assert_eq!(layout.kind, LayoutKind::PitchElevation);
        assert!(!layout.index_axis);
        assert_eq!(layout.time, ramp(6));
        assert_eq!(layout.sources, vec!["t", "raw"]);
        assert_eq!(layout.states.dim(), (2, 6));
        assert_eq!(layout.states.row(0), raw.row(2));
        assert_eq!(layout.states.row(1), raw.row(4));
    }

    #[test]
    fn test_narrow_matrix_has_no_pitch_elevation_fallback() {
        let raw = Array2::from_shape_fn((25, 5), |(r, c)| ((r * 5 + c) as f64).cos());
        let vars = set(vec![("raw", raw.into_dyn())]);
        assert!(resolve_layout(&vars, &ResolverConfig::default()).is_none());
    }

    #[test]
    fn test_no_layout_without_increasing_array() {
        let vars = set(vec![
            ("a", Array2::<f64>::ones((5, 5)).into_dyn()),
            ("b", array![3.0, 2.0, 1.0].into_dyn()),
            ("c", ndarray::arr0(1.0).into_dyn()),
        ]);
        assert!(resolve_layout(&vars, &ResolverConfig::default()).is_none());
    }
}
