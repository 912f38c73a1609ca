// src/data_input/variables.rs

use std::path::Path;

use log::debug;

use crate::data_input::mat_reader::{read_mat_file, squeeze, MatFile, MatReadError};
use crate::types::VariableSet;

/// Container bookkeeping entries (`__header__`, `__globals__`, ...) use
/// double-underscore wrapped names and never hold user data.
pub fn is_metadata_key(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__")
}

/// Loads every numeric user variable of a MAT-file, squeezed.
///
/// Non-numeric arrays are dropped (logged at debug level). An empty set is
/// a valid result; callers decide whether that is worth a skip message.
pub fn load_variable_set(path: &Path) -> Result<VariableSet, MatReadError> {
    let mat = read_mat_file(path)?;
    for skipped in &mat.skipped {
        debug!(
            "Skipping non-numeric variable '{}' ({}{})",
            skipped.name,
            skipped.class,
            if skipped.logical { ", logical" } else { "" }
        );
    }
    Ok(variable_set_from(mat))
}

/// Converts a decoded file into a [`VariableSet`], filtering metadata keys.
pub fn variable_set_from(mat: MatFile) -> VariableSet {
    mat.variables
        .into_iter()
        .filter(|v| {
            let keep = !is_metadata_key(&v.name);
            if !keep {
                debug!("Omitting metadata entry '{}'", v.name);
            }
            keep
        })
        .map(|v| (v.name, squeeze(v.data)))
        .collect()
}
