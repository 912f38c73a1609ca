// src/data_input/enumerate.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lists the regular files directly inside `dir` whose extension matches
/// `extension` (case-insensitive, leading dot optional), sorted by path.
/// Subdirectories are not descended into.
pub fn find_data_files(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let wanted = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output file name for one plot: `<stem>__<suffix>.png`.
pub fn output_file_name(input: &Path, suffix: &str) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}__{suffix}.png")
}
