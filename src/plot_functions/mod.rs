// src/plot_functions/mod.rs

pub mod plot_states;
pub mod plot_variable;

// src/plot_functions/mod.rs
