// src/data_analysis/selection.rs

use ndarray::Axis;

use crate::constants::{MIN_TIME_SAMPLES, SELECT_ALL};
use crate::data_analysis::layout::ResolvedLayout;
use crate::state_labels::synthetic_label;
use crate::types::{StateBlock, TimeSeries};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("state block has {states} samples but time vector has {time}")]
    LengthMismatch { time: usize, states: usize },
    #[error("need at least 2 samples, got {0}")]
    TooFewSamples(usize),
}

/// Parses a series selection into sorted, de-duplicated zero-based indices.
///
/// * `"all"` (any case) selects everything.
/// * Comma separated names select by label (case-insensitive), but only when
///   every token names a known label.
/// * Otherwise tokens are read as 1-based indices; out-of-range and
///   non-numeric tokens are dropped.
/// * When nothing survives, everything is selected.
pub fn select_series(spec: &str, labels: &[String]) -> Vec<usize> {
    let all = || (0..labels.len()).collect::<Vec<_>>();
    if spec.trim().eq_ignore_ascii_case(SELECT_ALL) {
        return all();
    }

    let tokens: Vec<String> = spec
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return all();
    }

    let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let by_name: Option<Vec<usize>> = tokens
        .iter()
        .map(|token| lowered.iter().position(|label| label == token))
        .collect();
    if let Some(indices) = by_name {
        return sorted_unique(indices);
    }

    let by_index: Vec<usize> = tokens
        .iter()
        .filter(|token| token.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|token| token.parse::<usize>().ok())
        .filter(|&one_based| (1..=labels.len()).contains(&one_based))
        .map(|one_based| one_based - 1)
        .collect();
    if by_index.is_empty() {
        log::debug!("Selection '{spec}' matched nothing; plotting every series");
        return all();
    }
    sorted_unique(by_index)
}

fn sorted_unique(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Inclusive time window; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
}

impl TimeWindow {
    pub fn new(tmin: Option<f64>, tmax: Option<f64>) -> Self {
        Self { tmin, tmax }
    }

    pub fn is_unbounded(&self) -> bool {
        self.tmin.is_none() && self.tmax.is_none()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.tmin.map_or(true, |lo| t >= lo) && self.tmax.map_or(true, |hi| t <= hi)
    }
}

/// Keeps the samples inside `window`.
///
/// If fewer than two samples would remain the crop is discarded and the
/// input is returned unchanged; the flag reports whether the crop was applied.
pub fn crop_time(
    time: &TimeSeries,
    states: &StateBlock,
    window: &TimeWindow,
) -> (TimeSeries, StateBlock, bool) {
    if window.is_unbounded() {
        return (time.clone(), states.clone(), false);
    }
    let keep: Vec<usize> = time
        .iter()
        .enumerate()
        .filter(|(_, t)| window.contains(**t))
        .map(|(i, _)| i)
        .collect();
    if keep.len() < MIN_TIME_SAMPLES {
        return (time.clone(), states.clone(), false);
    }
    (
        time.select(Axis(0), &keep),
        states.select(Axis(1), &keep),
        true,
    )
}

/// Everything the renderer needs for one state plot.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub time: TimeSeries,
    pub states: StateBlock,
    pub labels: Vec<String>,
    pub selected: Vec<usize>,
}

impl PlotRequest {
    /// Validates the time/state alignment and drops out-of-range indices.
    /// An empty selection means every series.
    pub fn new(
        time: TimeSeries,
        states: StateBlock,
        labels: Vec<String>,
        selected: Vec<usize>,
    ) -> Result<Self, SelectionError> {
        if states.ncols() != time.len() {
            return Err(SelectionError::LengthMismatch {
                time: time.len(),
                states: states.ncols(),
            });
        }
        if time.len() < MIN_TIME_SAMPLES {
            return Err(SelectionError::TooFewSamples(time.len()));
        }
        let mut selected: Vec<usize> = selected
            .into_iter()
            .filter(|&i| i < states.nrows())
            .collect();
        if selected.is_empty() {
            selected = (0..states.nrows()).collect();
        }
        Ok(Self {
            time,
            states,
            labels,
            selected,
        })
    }

    /// Applies the selection spec and time window to a resolved layout.
    pub fn build(
        layout: &ResolvedLayout,
        spec: &str,
        window: &TimeWindow,
    ) -> Result<Self, SelectionError> {
        let selected = select_series(spec, &layout.labels);
        let (time, states, cropped) = crop_time(&layout.time, &layout.states, window);
        if !cropped && !window.is_unbounded() {
            log::warn!(
                "Time window {:?}..{:?} leaves fewer than {} samples; plotting the full range",
                window.tmin,
                window.tmax,
                MIN_TIME_SAMPLES
            );
        }
        Self::new(time, states, layout.labels.clone(), selected)
    }

    pub fn label_for(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| synthetic_label(index))
    }

    pub fn sample_count(&self) -> usize {
        self.time.len()
    }
}
