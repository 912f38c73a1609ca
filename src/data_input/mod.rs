// src/data_input/mod.rs

pub mod enumerate;
pub mod mat_reader;
pub mod mat_writer;
pub mod variables;

// src/data_input/mod.rs
