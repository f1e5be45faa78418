//! CLI command implementations

pub mod check;
pub mod compatible;
pub mod completions;
pub mod cost;
pub mod metrics;
pub mod rules;
pub mod validate;
