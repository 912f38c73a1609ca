// src/data_analysis/mod.rs

pub mod layout;
pub mod selection;

// src/data_analysis/mod.rs
