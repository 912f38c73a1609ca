// src/main.rs

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::warn;

use mat_plot_render::batch::{
    parse_figsize, run, BatchOutcome, PlotMode, RunConfig, VariableFilter,
};
use mat_plot_render::constants::{
    DEFAULT_DATA_EXTENSION, DEFAULT_DPI, DEFAULT_FIGSIZE_IN, DEFAULT_MIN_STATE_SERIES,
    DEFAULT_X_LABEL, SELECT_ALL, STATE_Y_LABEL,
};
use mat_plot_render::data_analysis::layout::ResolverConfig;
use mat_plot_render::data_analysis::selection::TimeWindow;
use mat_plot_render::plot_framework::{RenderConfig, YLimits};
use mat_plot_render::state_labels::{default_state_labels, parse_label_list};

/// Batch-plot MAT files: find time and state data in every file of a folder
/// and write one PNG chart per file.
#[derive(Parser, Debug)]
#[command(name = "mat_plot_render")]
#[command(author, version = mat_plot_render::crate_version(), about, long_about = None)]
struct Cli {
    /// Folder containing the data files
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Output folder for plots (default: <input>/figs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to plot for each file
    #[arg(long, value_enum, default_value_t = PlotMode::States)]
    mode: PlotMode,

    /// States to plot: "all", names ("pitch,elevation") or 1-based indices ("3,5")
    #[arg(long, default_value = SELECT_ALL)]
    states: String,

    /// Variables mode: plot only this variable
    #[arg(long, conflicts_with = "all_vars")]
    var: Option<String>,

    /// Variables mode: plot every numeric variable instead of just the first
    #[arg(long)]
    all_vars: bool,

    /// Min time (seconds) to include
    #[arg(long, allow_hyphen_values = true)]
    tmin: Option<f64>,

    /// Max time (seconds) to include
    #[arg(long, allow_hyphen_values = true)]
    tmax: Option<f64>,

    /// Figure size W,H in inches
    #[arg(long, default_value = "14,6")]
    figsize: String,

    /// PNG DPI
    #[arg(long, default_value_t = DEFAULT_DPI, value_parser = clap::value_parser!(u32).range(10..=1200))]
    dpi: u32,

    /// Lower y-axis limit
    #[arg(long, allow_hyphen_values = true)]
    ymin: Option<f64>,

    /// Upper y-axis limit
    #[arg(long, allow_hyphen_values = true)]
    ymax: Option<f64>,

    /// Symmetric y-limits [-yabs, +yabs] (overrides --ymin/--ymax)
    #[arg(long, allow_hyphen_values = true)]
    yabs: Option<f64>,

    /// Y-axis label for state plots
    #[arg(long, default_value = STATE_Y_LABEL)]
    ylabel: String,

    /// Comma separated series labels (default: lambda,lambda_dot,pitch,pitch_dot,elevation,elevation_dot)
    #[arg(long)]
    labels: Option<String>,

    /// Minimum series count for a matrix paired with a separate time vector
    #[arg(long, default_value_t = DEFAULT_MIN_STATE_SERIES)]
    min_series: usize,

    /// Data file extension
    #[arg(long, default_value = DEFAULT_DATA_EXTENSION)]
    ext: String,

    /// Resolve and report only, do not write PNG files
    #[arg(long)]
    no_save: bool,

    /// Print a min/max summary of what would be plotted
    #[arg(long)]
    show: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

impl Cli {
    fn into_run_config(self) -> RunConfig {
        let figsize = parse_figsize(&self.figsize).unwrap_or_else(|| {
            warn!(
                "Invalid --figsize '{}'; using {},{}",
                self.figsize, DEFAULT_FIGSIZE_IN.0, DEFAULT_FIGSIZE_IN.1
            );
            DEFAULT_FIGSIZE_IN
        });

        let labels = self
            .labels
            .as_deref()
            .and_then(parse_label_list)
            .unwrap_or_else(default_state_labels);

        let variables = match (self.var, self.all_vars) {
            (Some(name), _) => VariableFilter::Named(name),
            (None, true) => VariableFilter::All,
            (None, false) => VariableFilter::First,
        };

        RunConfig {
            input_dir: self.input,
            output_dir: self.output,
            extension: self.ext,
            mode: self.mode,
            selection: self.states,
            window: TimeWindow::new(self.tmin, self.tmax),
            variables,
            resolver: ResolverConfig {
                min_state_series: self.min_series,
                labels,
                ..ResolverConfig::default()
            },
            render: RenderConfig {
                figsize,
                dpi: self.dpi,
                x_label: DEFAULT_X_LABEL.to_string(),
                y_label: self.ylabel,
                y_limits: YLimits::from_bounds(self.ymin, self.ymax, self.yabs),
                ..RenderConfig::default()
            },
            save: !self.no_save,
            show: self.show,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = cli.into_run_config();
    match run(&config)? {
        BatchOutcome::MissingInput(_) | BatchOutcome::NoFiles(_) => {}
        BatchOutcome::Completed(summary) => {
            if config.show || !config.save {
                println!(
                    "{} files, {} plots saved, {} skipped",
                    summary.files_seen, summary.plots_saved, summary.files_skipped
                );
            }
        }
    }
    Ok(())
}

// src/main.rs
