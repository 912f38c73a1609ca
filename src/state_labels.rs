//! Centralized state naming utilities
//!
//! Provides consistent series names across the layout resolver, the selector
//! and the plot functions.

/// State order used by the lab's combined `ans` logs (time row excluded).
pub const DEFAULT_STATE_LABELS: [&str; 6] = [
    "lambda",
    "lambda_dot",
    "pitch",
    "pitch_dot",
    "elevation",
    "elevation_dot",
];

/// Synthetic name for the zero-based series `index` ("State 1", "State 2", ...).
pub fn synthetic_label(index: usize) -> String {
    format!("State {}", index + 1)
}

/// Owned copy of [`DEFAULT_STATE_LABELS`].
pub fn default_state_labels() -> Vec<String> {
    DEFAULT_STATE_LABELS.iter().map(|s| s.to_string()).collect()
}

/// Labels for `count` series.
///
/// Known labels are used (truncated) when they cover every series; otherwise
/// all series fall back to synthetic names so the legend never mixes the two.
pub fn label_series(count: usize, known: &[String]) -> Vec<String> {
    if count <= known.len() {
        known[..count].to_vec()
    } else {
        (0..count).map(synthetic_label).collect()
    }
}

/// Parses a comma separated label list such as `"pitch,pitch_dot,elevation"`.
/// Empty entries are dropped; returns `None` when nothing is left.
pub fn parse_label_list(spec: &str) -> Option<Vec<String>> {
    let labels: Vec<String> = spec
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!labels.is_empty()).then_some(labels)
}
