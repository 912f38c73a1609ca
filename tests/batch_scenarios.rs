// tests/batch_scenarios.rs
// End-to-end runs over temporary folders of MAT-files.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use tempfile::tempdir;

use mat_plot_render::batch::{run, BatchOutcome, BatchSummary, PlotMode, RunConfig, VariableFilter};
use mat_plot_render::data_analysis::layout::{resolve_layout, ResolverConfig};
use mat_plot_render::data_analysis::selection::{PlotRequest, TimeWindow};
use mat_plot_render::data_input::mat_writer::MatWriter;
use mat_plot_render::data_input::variables::load_variable_set;
use mat_plot_render::plot_framework::RenderConfig;
use mat_plot_render::plot_functions::plot_states::state_series;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn small_render() -> RenderConfig {
    RenderConfig {
        figsize: (3.0, 2.0),
        dpi: 60,
        ..RenderConfig::default()
    }
}

fn config_for(dir: &Path) -> RunConfig {
    RunConfig {
        input_dir: dir.to_path_buf(),
        render: small_render(),
        ..RunConfig::default()
    }
}

/// (7, n): increasing time row followed by six state rows.
fn ans_block(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((7, n), |(r, c)| {
        let t = c as f64 * 0.05;
        if r == 0 {
            t
        } else {
            (t * r as f64).sin()
        }
    })
}

fn completed(outcome: BatchOutcome) -> BatchSummary {
    match outcome {
        BatchOutcome::Completed(summary) => summary,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

fn png_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".png"))
        .collect();
    names.sort();
    names
}

#[test]
fn combined_ans_file_produces_one_states_png() {
    let dir = tempdir().unwrap();
    let mut writer = MatWriter::new();
    writer.add_matrix("ans", &ans_block(100));
    writer.write_to(&dir.path().join("run1.mat")).unwrap();

    let summary = completed(run(&config_for(dir.path())).unwrap());
    assert_eq!(summary.files_seen, 1);
    assert_eq!(summary.plots_saved, 1);
    assert_eq!(summary.files_skipped, 0);

    let figs = dir.path().join("figs");
    assert_eq!(png_files(&figs), vec!["run1__states.png"]);
    let bytes = fs::read(figs.join("run1__states.png")).unwrap();
    assert!(bytes.starts_with(&PNG_SIGNATURE));
}

#[test]
fn combined_ans_file_draws_six_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run1.mat");
    let mut writer = MatWriter::new().compressed(true);
    writer.add_matrix("ans", &ans_block(100));
    writer.write_to(&path).unwrap();

    let vars = load_variable_set(&path).unwrap();
    let layout = resolve_layout(&vars, &ResolverConfig::default()).unwrap();
    let request = PlotRequest::build(&layout, "all", &TimeWindow::default()).unwrap();
    let series = state_series(&request, 1);
    assert_eq!(series.len(), 6);
    assert!(series.iter().all(|s| s.data.len() == 100));
    assert_eq!(series[0].label, "lambda");
    assert_eq!(series[5].label, "elevation_dot");
}

// `files_skipped` is bumped exactly where the skip line is logged, so one
// skipped file means one skip line.
#[test]
fn file_without_increasing_array_is_skipped() {
    let dir = tempdir().unwrap();
    let mut writer = MatWriter::new();
    writer.add_matrix("flat", &Array2::ones((30, 4)));
    writer.add_vector("t", &[3.0, 2.0, 1.0]);
    writer.write_to(&dir.path().join("bad.mat")).unwrap();

    let summary = completed(run(&config_for(dir.path())).unwrap());
    assert_eq!(summary.plots_saved, 0);
    assert_eq!(summary.files_skipped, 1);
    assert!(png_files(&dir.path().join("figs")).is_empty());
}

#[test]
fn empty_folder_creates_no_output_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), "not data").unwrap();

    let outcome = run(&config_for(dir.path())).unwrap();
    assert!(matches!(outcome, BatchOutcome::NoFiles(_)));
    assert!(!dir.path().join("figs").exists());
}

#[test]
fn missing_folder_stops_the_run() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let outcome = run(&config_for(&missing)).unwrap();
    assert!(matches!(outcome, BatchOutcome::MissingInput(_)));
    assert!(!missing.exists());
}

#[test]
fn corrupt_file_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_corrupt.mat"), b"definitely not a mat file").unwrap();
    let mut writer = MatWriter::new();
    writer.add_matrix("ans", &ans_block(20));
    writer.write_to(&dir.path().join("b_good.mat")).unwrap();

    let summary = completed(run(&config_for(dir.path())).unwrap());
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.plots_saved, 1);
    assert_eq!(png_files(&dir.path().join("figs")), vec!["b_good__states.png"]);
}

#[test]
fn overflowing_dimensions_do_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let mut bad = MatWriter::new();
    bad.add_array("bad", &[0x7fff_ffff; 5], &[]);
    bad.write_to(&dir.path().join("a_bad.mat")).unwrap();
    let mut good = MatWriter::new();
    good.add_matrix("ans", &ans_block(10));
    good.write_to(&dir.path().join("b_good.mat")).unwrap();

    let summary = completed(run(&config_for(dir.path())).unwrap());
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(png_files(&dir.path().join("figs")), vec!["b_good__states.png"]);
}

#[test]
fn wide_raw_log_falls_back_to_pitch_elevation_plot() {
    let dir = tempdir().unwrap();
    let mut writer = MatWriter::new();
    writer.add_matrix(
        "raw",
        &Array2::from_shape_fn((40, 6), |(r, c)| ((r * 6 + c) as f64 * 0.3).cos()),
    );
    writer.write_to(&dir.path().join("lab1.mat")).unwrap();

    let summary = completed(run(&config_for(dir.path())).unwrap());
    assert_eq!(summary.plots_saved, 1);
    assert_eq!(summary.files_skipped, 0);
    assert_eq!(
        png_files(&dir.path().join("figs")),
        vec!["lab1__raw__pitch_elev.png"]
    );
}

#[test]
fn separate_time_layout_uses_matrix_name_as_suffix() {
    let dir = tempdir().unwrap();
    let t: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
    let mut writer = MatWriter::new();
    writer.add_vector("time", &t);
    writer.add_matrix("y", &Array2::from_shape_fn((40, 3), |(r, c)| (r + c) as f64));
    writer.write_to(&dir.path().join("lab2.mat")).unwrap();

    let config = RunConfig {
        selection: "pitch,lambda".to_string(),
        ..config_for(dir.path())
    };
    let summary = completed(run(&config).unwrap());
    assert_eq!(summary.plots_saved, 1);
    assert!(summary.outputs[0].ends_with("lab2__y.png"));
}

#[test]
fn custom_output_folder_is_used() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("plots").join("nested");
    let mut writer = MatWriter::new();
    writer.add_matrix("ans", &ans_block(10));
    writer.write_to(&dir.path().join("x.MAT")).unwrap();

    let config = RunConfig {
        output_dir: Some(out.clone()),
        ..config_for(dir.path())
    };
    completed(run(&config).unwrap());
    assert_eq!(png_files(&out), vec!["x__states.png"]);
    assert!(!dir.path().join("figs").exists());
}

#[test]
fn no_save_resolves_without_writing() {
    let dir = tempdir().unwrap();
    let mut writer = MatWriter::new();
    writer.add_matrix("ans", &ans_block(10));
    writer.write_to(&dir.path().join("x.mat")).unwrap();

    let config = RunConfig {
        save: false,
        ..config_for(dir.path())
    };
    let summary = completed(run(&config).unwrap());
    assert_eq!(summary.plots_saved, 0);
    assert_eq!(summary.files_skipped, 0);
    assert!(!dir.path().join("figs").exists());
}

#[test]
fn variables_mode_plots_each_requested_variable() {
    let dir = tempdir().unwrap();
    let mut writer = MatWriter::new();
    writer.add_vector("a", &[1.0, 3.0, 2.0, 5.0]);
    writer.add_matrix("b", &Array2::from_shape_fn((6, 2), |(r, c)| (r * c) as f64));
    writer.add_array("cube", &[2, 2, 2], &[0.0; 8]);
    writer.write_to(&dir.path().join("lab1.mat")).unwrap();

    let first = RunConfig {
        mode: PlotMode::Variables,
        ..config_for(dir.path())
    };
    let summary = completed(run(&first).unwrap());
    assert_eq!(summary.plots_saved, 1);
    assert_eq!(png_files(&dir.path().join("figs")), vec!["lab1__a.png"]);

    let all = RunConfig {
        variables: VariableFilter::All,
        ..first.clone()
    };
    let summary = completed(run(&all).unwrap());
    assert_eq!(summary.plots_saved, 2);
    assert_eq!(
        png_files(&dir.path().join("figs")),
        vec!["lab1__a.png", "lab1__b.png"]
    );

    let missing = RunConfig {
        variables: VariableFilter::Named("zzz".to_string()),
        ..first
    };
    let summary = completed(run(&missing).unwrap());
    assert_eq!(summary.plots_saved, 0);
    assert_eq!(summary.files_skipped, 1);
}

// tests/batch_scenarios.rs
