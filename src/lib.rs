//! KBT: Kart Build Toolkit
//!
//! Checks go-kart builds for part compatibility and estimates their
//! performance and cost. Catalogs are plain YAML files; compatibility rules
//! are data, evaluated against the selected engine or motor and parts.

pub mod cli;
pub mod compat;
pub mod core;
pub mod entities;
pub mod metrics;
pub mod yaml;
