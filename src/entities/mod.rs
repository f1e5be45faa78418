//! Catalog record types
//!
//! **Power sources:**
//! - [`Engine`] - Gas engines with shaft geometry
//! - [`Motor`] - Electric motors with system voltage
//!
//! **Parts:**
//! - [`Part`] - Categorised parts with an open-ended [`Specifications`] map
//!
//! **Compatibility data:**
//! - [`Rule`] - Declarative source/target checks
//! - [`DirectMapping`] - Admin-curated overrides for one engine and one part
//!
//! **Selections:**
//! - [`BuildFile`] - Ids as written on disk
//! - [`Build`] - Resolved records ready for evaluation

pub mod build;
pub mod engine;
pub mod motor;
pub mod part;
pub mod rule;
pub mod spec_value;

pub use build::{Build, BuildFile, PartRef, PowerSource, PowerSourceType};
pub use engine::{Engine, ShaftType};
pub use motor::Motor;
pub use part::{CategoryGroup, Part, PartCategory};
pub use rule::{CompatibilityLevel, DirectMapping, Rule, RuleSource, Severity};
pub use spec_value::{SpecValue, Specifications};
