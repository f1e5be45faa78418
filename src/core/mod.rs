//! Core module - catalog loading, configuration, caching and logging

pub mod cache;
pub mod config;
pub mod entity;
pub mod loader;
pub mod logging;

pub use cache::{fingerprint, CacheError, RuleCache};
pub use config::Config;
pub use entity::CatalogRecord;
pub use loader::{load_build_file, Catalog, CatalogError, RejectedRow};
