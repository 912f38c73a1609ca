// src/bin/generate_sample.rs
// Writes demonstration MAT-files covering each supported layout.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ndarray::Array2;

use mat_plot_render::data_input::mat_reader::Endian;
use mat_plot_render::data_input::mat_writer::MatWriter;

const SAMPLES: usize = 500;
const DT: f64 = 0.02;

/// Damped helicopter-like response for state `k` at time `t`.
fn state_signal(k: usize, t: f64) -> f64 {
    let freq = 0.3 + 0.15 * k as f64;
    let decay = (-0.15 * t).exp();
    let amplitude = 0.4 / (1.0 + k as f64 * 0.5);
    let phase = k as f64 * 0.7;
    amplitude * decay * (2.0 * std::f64::consts::PI * freq * t + phase).sin()
}

/// (1 + states, SAMPLES) with time in row 0.
fn combined_block(states: usize) -> Array2<f64> {
    Array2::from_shape_fn((states + 1, SAMPLES), |(r, c)| {
        let t = c as f64 * DT;
        if r == 0 {
            t
        } else {
            state_signal(r - 1, t)
        }
    })
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    // Combined "ans" layout, time + 6 states along rows, compressed like MATLAB's default save.
    let mut writer = MatWriter::new().compressed(true);
    writer.add_matrix("ans", &combined_block(6));
    let path = out_dir.join("heli_combined.mat");
    writer
        .write_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    // Separate time vector plus an (N x 4) matrix, big-endian.
    let block = combined_block(4);
    let mut writer = MatWriter::new().with_endian(Endian::Big);
    writer.add_vector("t", &block.row(0).to_vec());
    writer.add_matrix("y", &block.slice(ndarray::s![1.., ..]).t().to_owned());
    writer.add_char("note", "separate time vector");
    let path = out_dir.join("heli_separate.mat");
    writer
        .write_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    // Embedded time in column 0 of an (N x 4) log.
    let mut writer = MatWriter::new();
    writer.add_matrix("logdata", &combined_block(3).reversed_axes());
    let path = out_dir.join("heli_embedded.mat");
    writer
        .write_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    // Raw six-state log with no time at all: falls back to pitch/elevation over sample index.
    let raw = Array2::from_shape_fn((SAMPLES, 6), |(r, c)| state_signal(c, r as f64 * DT));
    let mut writer = MatWriter::new();
    writer.add_matrix("raw", &raw);
    let path = out_dir.join("heli_raw.mat");
    writer
        .write_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    // Nothing increasing anywhere: skipped in states mode, still plottable as variables.
    let noise = Array2::from_shape_fn((SAMPLES, 2), |(r, c)| state_signal(1 - c, r as f64 * DT));
    let mut writer = MatWriter::new();
    writer.add_matrix("noise", &noise);
    let path = out_dir.join("no_layout.mat");
    writer
        .write_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());

    Ok(())
}

// src/bin/generate_sample.rs
