// src/constants.rs

use plotters::style::RGBColor;

// --- Input discovery ---
pub const DEFAULT_DATA_EXTENSION: &str = "mat";
pub const DEFAULT_FIGS_DIR: &str = "figs";

// --- Layout detection ---
// Lab convention: one variable holds "1 time + K states" along one axis.
pub const COMBINED_LAYOUT_VARIABLE: &str = "ans";
pub const COMBINED_LAYOUT_AXIS_LENGTHS: [usize; 2] = [6, 7];
pub const COMBINED_LAYOUT_SUFFIX: &str = "states";

// Names tried, in order, when looking for a standalone time vector.
pub const TIME_VARIABLE_CANDIDATES: [&str; 4] = ["t", "time", "Time", "timestamp"];

// Fallback for raw state logs: plot two known columns of a wide matrix.
pub const PITCH_ELEVATION_MIN_COLUMNS: usize = 6;
pub const PITCH_ELEVATION_COLUMNS: [usize; 2] = [2, 4];
pub const PITCH_ELEVATION_LABELS: [&str; 2] = ["pitch", "elevation"];
pub const PITCH_ELEVATION_SUFFIX: &str = "pitch_elev";

pub const MIN_TIME_SAMPLES: usize = 2;
pub const DEFAULT_MIN_STATE_SERIES: usize = 1;

// --- Selection ---
pub const SELECT_ALL: &str = "all";

// --- Figure defaults (matplotlib-style inches x DPI) ---
pub const DEFAULT_FIGSIZE_IN: (f64, f64) = (14.0, 6.0);
pub const DEFAULT_DPI: u32 = 150;
pub const MIN_PLOT_PIXELS: u32 = 64;
pub const MAX_PLOT_PIXELS: u32 = 16_384;

pub const DEFAULT_X_LABEL: &str = "time [s]";
pub const DEFAULT_Y_LABEL: &str = "value";
pub const STATE_Y_LABEL: &str = "angle [rad]";
pub const INDEX_X_LABEL: &str = "index";

// Stroke widths for lines (pixels at 100 DPI, scaled with DPI).
pub const LINE_WIDTH_PLOT: u32 = 2;
pub const LINE_WIDTH_LEGEND: u32 = 3;

// Padding applied around auto-computed ranges.
pub const RANGE_PADDING_FRACTION: f64 = 0.05;
pub const RANGE_PADDING_FLAT: f64 = 0.5;

// --- Series colors (tab10 cycle) ---
pub const SERIES_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub const GRID_ALPHA_BOLD: f64 = 0.25;
pub const GRID_ALPHA_LIGHT: f64 = 0.08;
pub const LEGEND_BACKGROUND_ALPHA: f64 = 0.8;

// src/constants.rs
