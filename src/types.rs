// src/types.rs
// Shared aliases for the data that flows from loader to renderer.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayD};

/// Any numeric variable read from a container, already squeezed.
/// Rank 1 and rank 2 are usable; everything else is rejected downstream.
pub type NumericArray = ArrayD<f64>;

/// All user variables of one input file, keyed by name.
/// A `BTreeMap` so every candidate search walks keys in lexicographic order.
pub type VariableSet = BTreeMap<String, NumericArray>;

/// Strictly increasing sample times.
pub type TimeSeries = Array1<f64>;

/// State matrix laid out as (series, samples).
pub type StateBlock = Array2<f64>;

/// (x, y) points of one plotted line.
pub type SeriesPoints = Vec<(f64, f64)>;

// src/types.rs
