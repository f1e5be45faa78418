//! Direct mapping resolver - admin-curated engine/part overrides

use std::collections::BTreeMap;

use crate::entities::rule::{CompatibilityLevel, DirectMapping, Severity};

/// The mapping found for one part
#[derive(Debug, Clone, PartialEq)]
pub struct DirectFit {
    pub level: CompatibilityLevel,
    pub notes: Option<String>,
}

impl DirectFit {
    /// Apply this override to a rule verdict of the given severity.
    ///
    /// Returns `None` when the verdict is suppressed.
    pub fn adjust(&self, severity: Severity) -> Option<Severity> {
        match (self.level, severity) {
            (CompatibilityLevel::DirectFit, Severity::Error) => None,
            (CompatibilityLevel::RequiresModification, Severity::Error) => Some(Severity::Warning),
            (_, other) => Some(other),
        }
    }

    /// Note surfaced for the pair independent of rule outcomes
    pub fn note(&self) -> Option<(Severity, String)> {
        match self.level {
            CompatibilityLevel::DirectFit => None,
            CompatibilityLevel::RequiresModification => Some((
                Severity::Warning,
                self.notes
                    .clone()
                    .unwrap_or_else(|| "This part requires modification to fit this engine".to_string()),
            )),
            CompatibilityLevel::AdapterRequired => Some((
                Severity::Info,
                self.notes.clone().unwrap_or_else(|| {
                    "An adapter is required to use this part with this engine".to_string()
                }),
            )),
        }
    }
}

/// Look up mappings for `engine_id` and the given parts.
///
/// Only the first mapping for a given pair is used; duplicates are logged.
pub fn resolve_direct<'a, I>(
    engine_id: &str,
    part_ids: I,
    mappings: &[DirectMapping],
) -> BTreeMap<String, DirectFit>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted: Vec<&str> = part_ids.into_iter().collect();
    let mut resolved = BTreeMap::new();

    for mapping in mappings
        .iter()
        .filter(|m| m.engine_id == engine_id && wanted.contains(&m.part_id.as_str()))
    {
        if resolved.contains_key(&mapping.part_id) {
            tracing::warn!(
                engine_id,
                part_id = %mapping.part_id,
                "ignoring duplicate engine-part mapping"
            );
            continue;
        }
        resolved.insert(
            mapping.part_id.clone(),
            DirectFit {
                level: mapping.compatibility_level,
                notes: mapping.notes.clone(),
            },
        );
    }

    resolved
}
