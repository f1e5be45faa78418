//! Compatibility checking
//!
//! - [`condition`] - rule condition parsing and the per-pair matcher
//! - [`mapping`] - direct engine/part mappings and their precedence
//! - [`evaluator`] - runs a rule set over a whole build
//! - [`advisories`] - selection-level notes (missing drive, clutch plus converter)
//! - [`builtin`] - physical fit rules shipped with the tool

pub mod advisories;
pub mod builtin;
pub mod condition;
pub mod evaluator;
pub mod mapping;

pub use builtin::builtin_rules;
pub use condition::{
    match_condition, match_parsed, values_equal, Condition, MatchOptions, MatchResult, RuleError,
    Subject, DEFAULT_TOLERANCE,
};
pub use evaluator::{
    compatible_parts, evaluate_compatibility, has_incompatibilities, sort_by_severity, CompatibilityWarning,
    Evaluator, EvaluatorOptions,
};
pub use mapping::{resolve_direct, DirectFit};
