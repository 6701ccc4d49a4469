//! CLI command implementations

pub mod calc;
pub mod completions;
pub mod config;
pub mod fields;
pub mod insert;
pub mod layer;
pub mod recalc;
pub mod types;
