//! Compatibility rule record and direct engine-part mappings
//!
//! Rules are data: the `condition` blob is kept as loosely-typed JSON and only
//! parsed by the condition matcher, so one malformed rule cannot prevent the
//! rest of the catalog from loading.

use serde::{Deserialize, Serialize};

use crate::core::entity::CatalogRecord;
use crate::entities::engine::default_active;
use crate::entities::part::PartCategory;

/// Warning severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
}

impl Severity {
    /// Sort rank, most severe first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Which entity a rule reads its source values from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    Engine,
    Motor,
    Part(PartCategory),
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSource::Engine => "engine",
            RuleSource::Motor => "motor",
            RuleSource::Part(c) => c.as_str(),
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuleSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "engine" => Ok(RuleSource::Engine),
            "motor" => Ok(RuleSource::Motor),
            other => other.parse::<PartCategory>().map(RuleSource::Part),
        }
    }
}

impl Serialize for RuleSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Declarative compatibility rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,

    /// Tag grouping related checks (e.g. "shaft_fit", "chain_pitch")
    #[serde(default)]
    pub rule_type: String,

    pub source_category: RuleSource,

    pub target_category: PartCategory,

    /// Structured condition expression, parsed by the condition matcher
    #[serde(default)]
    pub condition: serde_json::Value,

    /// Message template rendered when the rule fires
    pub warning_message: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CatalogRecord for Rule {
    const KIND: &'static str = "rules";

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.rule_type
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        source_category: RuleSource,
        target_category: PartCategory,
        condition: serde_json::Value,
        warning_message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            rule_type: String::new(),
            source_category,
            target_category,
            condition,
            warning_message: warning_message.into(),
            severity,
            is_active: true,
        }
    }

    pub fn with_type(mut self, rule_type: impl Into<String>) -> Self {
        self.rule_type = rule_type.into();
        self
    }
}

/// Level of an admin-curated engine-part mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityLevel {
    DirectFit,
    RequiresModification,
    AdapterRequired,
}

impl std::fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompatibilityLevel::DirectFit => write!(f, "direct_fit"),
            CompatibilityLevel::RequiresModification => write!(f, "requires_modification"),
            CompatibilityLevel::AdapterRequired => write!(f, "adapter_required"),
        }
    }
}

/// Explicit compatibility override for one engine and one part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMapping {
    pub engine_id: String,

    pub part_id: String,

    pub compatibility_level: CompatibilityLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DirectMapping {
    pub fn new(
        engine_id: impl Into<String>,
        part_id: impl Into<String>,
        compatibility_level: CompatibilityLevel,
    ) -> Self {
        Self {
            engine_id: engine_id.into(),
            part_id: part_id.into(),
            compatibility_level,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_from_yaml() {
        let yaml = r#"
id: r-shaft
rule_type: shaft_fit
source_category: engine
target_category: clutch
condition:
  op: mismatch
  source_field: shaft_diameter
  target_field: bore_in
  tolerance: 0.01
warning_message: "Shaft diameter mismatch"
severity: error
"#;
        let rule: Rule = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rule.source_category, RuleSource::Engine);
        assert_eq!(rule.target_category, PartCategory::Clutch);
        assert_eq!(rule.severity, Severity::Error);
        assert!(rule.is_active);
        assert_eq!(rule.condition["op"], "mismatch");
    }

    #[test]
    fn test_rule_source_parse() {
        assert_eq!("engine".parse::<RuleSource>().unwrap(), RuleSource::Engine);
        assert_eq!(
            "chain".parse::<RuleSource>().unwrap(),
            RuleSource::Part(PartCategory::Chain)
        );
        assert!("spaceship".parse::<RuleSource>().is_err());
    }

    #[test]
    fn test_mapping_level_serialization() {
        let yaml = "engine_id: e1\npart_id: p1\ncompatibility_level: adapter_required\n";
        let mapping: DirectMapping = serde_yml::from_str(yaml).unwrap();
        assert_eq!(mapping.compatibility_level, CompatibilityLevel::AdapterRequired);
        assert!(mapping.notes.is_none());
    }

    #[test]
    fn test_severity_rank() {
        assert!(Severity::Error.rank() < Severity::Warning.rank());
        assert!(Severity::Warning.rank() < Severity::Info.rank());
        assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
    }
}
