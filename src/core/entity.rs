//! Catalog record trait - common interface for all catalog record types

use serde::de::DeserializeOwned;

/// Common trait for records loaded from the catalog (engines, motors, parts, rules)
pub trait CatalogRecord: DeserializeOwned {
    /// Record kind, used in diagnostics and as the catalog file stem (e.g. "engines")
    const KIND: &'static str;

    /// Get the record's unique ID
    fn id(&self) -> &str;

    /// Human-readable name shown in warnings and tables
    fn display_name(&self) -> &str;

    /// Whether the record participates in evaluation
    fn is_active(&self) -> bool {
        true
    }
}
