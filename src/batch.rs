// src/batch.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::constants::{DEFAULT_DATA_EXTENSION, DEFAULT_FIGS_DIR, INDEX_X_LABEL, SELECT_ALL};
use crate::data_analysis::layout::{resolve_layout, ResolverConfig};
use crate::data_analysis::selection::{PlotRequest, TimeWindow};
use crate::data_input::enumerate::{find_data_files, output_file_name};
use crate::data_input::variables::load_variable_set;
use crate::plot_framework::{RenderConfig, RenderError};
use crate::plot_functions::plot_states::{plot_states, print_series_summary};
use crate::plot_functions::plot_variable::plot_variable;
use crate::types::{NumericArray, VariableSet};

/// What gets drawn for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PlotMode {
    /// Resolve time + state layout and draw the selected states over time.
    #[default]
    States,
    /// Draw raw variables against their sample index.
    Variables,
}

/// Which variables are drawn in [`PlotMode::Variables`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VariableFilter {
    /// First plottable variable in name order.
    #[default]
    First,
    All,
    Named(String),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    /// Defaults to `<input_dir>/figs`.
    pub output_dir: Option<PathBuf>,
    pub extension: String,
    pub mode: PlotMode,
    /// Series selection: `all`, label names or 1-based indices.
    pub selection: String,
    pub window: TimeWindow,
    pub variables: VariableFilter,
    pub resolver: ResolverConfig,
    pub render: RenderConfig,
    pub save: bool,
    pub show: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            extension: DEFAULT_DATA_EXTENSION.to_string(),
            mode: PlotMode::default(),
            selection: SELECT_ALL.to_string(),
            window: TimeWindow::default(),
            variables: VariableFilter::default(),
            resolver: ResolverConfig::default(),
            render: RenderConfig::default(),
            save: true,
            show: false,
        }
    }
}

impl RunConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.join(DEFAULT_FIGS_DIR))
    }
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_seen: usize,
    pub plots_saved: usize,
    /// Files that failed to load or had nothing to plot.
    pub files_skipped: usize,
    /// Individual plots that failed to render.
    pub variables_failed: usize,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub enum BatchOutcome {
    MissingInput(PathBuf),
    NoFiles(PathBuf),
    Completed(BatchSummary),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("cannot list {}: {source}", .path.display())]
    ListInput { path: PathBuf, source: io::Error },
    #[error("cannot create output directory {}: {source}", .path.display())]
    CreateOutput { path: PathBuf, source: io::Error },
}

/// Parses `"W,H"` in inches. Both parts must be positive and finite.
pub fn parse_figsize(spec: &str) -> Option<(f64, f64)> {
    let (w, h) = spec.split_once(',')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    let valid = |v: f64| v.is_finite() && v > 0.0;
    (valid(w) && valid(h)).then_some((w, h))
}

/// Processes every matching file in the input folder.
///
/// Only a missing input folder stops the run early; per-file and per-plot
/// failures are logged, counted and skipped. The output folder is created
/// once, and only when there is at least one file to process.
pub fn run(config: &RunConfig) -> Result<BatchOutcome, BatchError> {
    let input = &config.input_dir;
    if !input.is_dir() {
        error!("Input folder does not exist: {}", input.display());
        return Ok(BatchOutcome::MissingInput(input.clone()));
    }

    let files = find_data_files(input, &config.extension).map_err(|source| {
        BatchError::ListInput {
            path: input.clone(),
            source,
        }
    })?;
    if files.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.extension.trim_start_matches('.'),
            input.display()
        );
        return Ok(BatchOutcome::NoFiles(input.clone()));
    }

    let out_dir = config.output_dir();
    if config.save {
        fs::create_dir_all(&out_dir).map_err(|source| BatchError::CreateOutput {
            path: out_dir.clone(),
            source,
        })?;
    }

    let mut summary = BatchSummary::default();
    for path in &files {
        summary.files_seen += 1;
        process_file(path, &out_dir, config, &mut summary);
    }

    info!(
        "Total plots saved: {} ({} files, {} skipped, {} failed plots)",
        summary.plots_saved, summary.files_seen, summary.files_skipped, summary.variables_failed
    );
    Ok(BatchOutcome::Completed(summary))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn process_file(path: &Path, out_dir: &Path, config: &RunConfig, summary: &mut BatchSummary) {
    let name = display_name(path);
    info!("Processing {name}");

    let vars = match load_variable_set(path) {
        Ok(vars) => vars,
        Err(e) => {
            warn!("Failed to load {name}: {e}");
            summary.files_skipped += 1;
            return;
        }
    };
    if vars.is_empty() {
        info!("No user variables found in {name}");
        summary.files_skipped += 1;
        return;
    }

    match config.mode {
        PlotMode::States => process_states(path, &name, &vars, out_dir, config, summary),
        PlotMode::Variables => process_variables(path, &name, &vars, out_dir, config, summary),
    }
}

fn process_states(
    path: &Path,
    name: &str,
    vars: &VariableSet,
    out_dir: &Path,
    config: &RunConfig,
    summary: &mut BatchSummary,
) {
    let Some(layout) = resolve_layout(vars, &config.resolver) else {
        info!("Skipping {name} (no time vector found).");
        summary.files_skipped += 1;
        return;
    };
    debug!(
        "{name}: {} layout from {:?}, {} series x {} samples",
        layout.kind,
        layout.sources,
        layout.series_count(),
        layout.sample_count()
    );

    let request = match PlotRequest::build(&layout, &config.selection, &config.window) {
        Ok(request) => request,
        Err(e) => {
            warn!("Skipping {name}: {e}");
            summary.files_skipped += 1;
            return;
        }
    };

    if config.show {
        print_series_summary(&request, name);
    }
    if !config.save {
        return;
    }

    let render = if layout.index_axis {
        RenderConfig {
            x_label: INDEX_X_LABEL.to_string(),
            ..config.render.clone()
        }
    } else {
        config.render.clone()
    };
    let out_file = out_dir.join(output_file_name(path, &layout.suffix));
    record(summary, out_file.clone(), plot_states(&request, &out_file, &render));
}

fn process_variables(
    path: &Path,
    name: &str,
    vars: &VariableSet,
    out_dir: &Path,
    config: &RunConfig,
    summary: &mut BatchSummary,
) {
    let plottable = |array: &NumericArray| matches!(array.ndim(), 1 | 2);
    let targets: Vec<(&String, &NumericArray)> = match &config.variables {
        VariableFilter::Named(wanted) => match vars.get_key_value(wanted) {
            Some(entry) => vec![entry],
            None => {
                info!("Variable {wanted} not found in {name}");
                Vec::new()
            }
        },
        VariableFilter::All => vars.iter().collect(),
        VariableFilter::First => vars.iter().find(|(_, a)| plottable(*a)).into_iter().collect(),
    };
    if targets.is_empty() {
        summary.files_skipped += 1;
        return;
    }

    for (key, array) in targets {
        if !plottable(array) {
            debug!("Skipping {key}: ndim={}", array.ndim());
            continue;
        }
        if config.show {
            println!("{name} - {key}: shape {:?}", array.shape());
        }
        if !config.save {
            continue;
        }
        let render = RenderConfig {
            title: Some(format!("{name} - {key}")),
            x_label: INDEX_X_LABEL.to_string(),
            y_label: key.clone(),
            ..config.render.clone()
        };
        let out_file = out_dir.join(output_file_name(path, key));
        record(summary, out_file.clone(), plot_variable(key, array, &out_file, &render));
    }
}

fn record(summary: &mut BatchSummary, out_file: PathBuf, result: Result<(), RenderError>) {
    match result {
        Ok(()) => {
            info!("Saved plot: {}", out_file.display());
            summary.plots_saved += 1;
            summary.outputs.push(out_file);
        }
        Err(e) => {
            warn!("Failed plotting {}: {e}", out_file.display());
            summary.variables_failed += 1;
        }
    }
}


// src/batch.rs
