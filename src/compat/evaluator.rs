//! Rule evaluator - runs active rules over a build and merges direct mappings
//!
//! Rules are parsed once when the evaluator is built; a rule whose condition
//! cannot be parsed is logged and left out, and every other rule still runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::compat::advisories::selection_advisories;
use crate::compat::condition::{match_parsed, Condition, MatchOptions, RuleError, Subject};
use crate::compat::mapping::{resolve_direct, DirectFit};
use crate::entities::build::PowerSource;
use crate::entities::engine::Engine;
use crate::entities::part::Part;
use crate::entities::rule::{CompatibilityLevel, DirectMapping, Rule, RuleSource, Severity};

/// One compatibility finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityWarning {
    #[serde(rename = "type")]
    pub severity: Severity,

    /// Display name of the triggering entity (engine, motor or source part)
    pub source: String,

    /// Display name of the part being checked
    pub target: String,

    pub message: String,

    /// Rule that produced the warning; `None` for mapping notes and advisories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl CompatibilityWarning {
    pub fn new(
        severity: Severity,
        source: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            source: source.into(),
            target: target.into(),
            message: message.into(),
            rule_id: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// True when any warning is an error
pub fn has_incompatibilities(warnings: &[CompatibilityWarning]) -> bool {
    warnings.iter().any(CompatibilityWarning::is_error)
}

/// Stable sort, errors first, then warnings, then info
pub fn sort_by_severity(warnings: &mut [CompatibilityWarning]) {
    warnings.sort_by_key(|w| w.severity.rank());
}

/// Evaluator settings
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorOptions {
    pub matching: MatchOptions,
    /// Append build-level advisories (missing drivetrain, clutch plus converter)
    pub advisories: bool,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            matching: MatchOptions::default(),
            advisories: true,
        }
    }
}

struct CompiledRule<'r> {
    rule: &'r Rule,
    condition: Condition,
}

/// Compatibility evaluator over a fixed rule set and mapping set
pub struct Evaluator<'r> {
    rules: Vec<CompiledRule<'r>>,
    mappings: &'r [DirectMapping],
    skipped: Vec<RuleError>,
    options: EvaluatorOptions,
}

impl<'r> Evaluator<'r> {
    /// Compile the active rules. Inactive rules are ignored; malformed ones are
    /// logged and recorded in [`Evaluator::skipped`].
    pub fn new(rules: &'r [Rule], mappings: &'r [DirectMapping]) -> Self {
        let mut compiled = Vec::new();
        let mut skipped = Vec::new();

        for rule in rules.iter().filter(|r| r.is_active) {
            match Condition::parse(rule) {
                Ok(condition) => compiled.push(CompiledRule { rule, condition }),
                Err(err) => {
                    tracing::warn!(rule_id = %rule.id, error = %err, "skipping malformed rule");
                    skipped.push(err);
                }
            }
        }

        Self {
            rules: compiled,
            mappings,
            skipped,
            options: EvaluatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Rules that could not be compiled
    pub fn skipped(&self) -> &[RuleError] {
        &self.skipped
    }

    /// Evaluate a build.
    ///
    /// Output order is rule order, then selection order, followed by mapping
    /// notes and advisories. Identical inputs give identical output. Each matching
    /// rule reports its own warning, even when another rule flagged the same pair.
    pub fn evaluate(&self, power: Option<&PowerSource>, parts: &[Part]) -> Vec<CompatibilityWarning> {
        if power.is_none() && parts.is_empty() {
            return Vec::new();
        }

        let parts = unique_parts(parts);
        let engine = power.and_then(PowerSource::engine);
        let direct: BTreeMap<String, DirectFit> = match engine {
            Some(e) => resolve_direct(&e.id, parts.iter().map(|p| p.id.as_str()), self.mappings),
            None => BTreeMap::new(),
        };

        let mut warnings = Vec::new();
        // Parts that produced an engine-sourced verdict
        let mut engine_verdicts: HashSet<&str> = HashSet::new();

        for compiled in &self.rules {
            let rule = compiled.rule;
            let targets: Vec<&Part> = parts
                .iter()
                .copied()
                .filter(|p| p.category == rule.target_category)
                .collect();
            if targets.is_empty() {
                continue;
            }

            for source in sources_for(rule.source_category, power, &parts) {
                for &target in &targets {
                    if let Subject::Part(sp) = source {
                        if sp.id == target.id {
                            continue;
                        }
                    }

                    let result = match_parsed(
                        rule,
                        &compiled.condition,
                        source,
                        Subject::Part(target),
                        &self.options.matching,
                    );
                    if !result.matched {
                        continue;
                    }

                    let mut severity = rule.severity;
                    if let Subject::Engine(_) = source {
                        engine_verdicts.insert(target.id.as_str());
                        if let Some(fit) = direct.get(&target.id) {
                            match fit.adjust(severity) {
                                Some(adjusted) => severity = adjusted,
                                None => {
                                    tracing::debug!(
                                        rule_id = %rule.id,
                                        part_id = %target.id,
                                        "verdict suppressed by direct-fit mapping"
                                    );
                                    continue;
                                }
                            }
                        }
                    }

                    warnings.push(CompatibilityWarning {
                        severity,
                        source: source.name().to_string(),
                        target: target.name.clone(),
                        message: result
                            .detail
                            .unwrap_or_else(|| rule.warning_message.clone()),
                        rule_id: Some(rule.id.clone()),
                    });
                }
            }
        }

        if let Some(engine) = engine {
            for part in &parts {
                let Some(fit) = direct.get(&part.id) else {
                    continue;
                };
                // A downgraded rule verdict already covers requires_modification
                if fit.level == CompatibilityLevel::RequiresModification
                    && engine_verdicts.contains(part.id.as_str())
                {
                    continue;
                }
                if let Some((severity, message)) = fit.note() {
                    warnings.push(CompatibilityWarning::new(
                        severity,
                        &engine.name,
                        &part.name,
                        message,
                    ));
                }
            }
        }

        if self.options.advisories {
            warnings.extend(selection_advisories(power, &parts));
        }

        warnings
    }

    /// Candidates usable with `engine`: a direct-fit mapping, or no
    /// engine-sourced error rule firing for the part.
    pub fn compatible_parts<'p>(
        &self,
        engine: &Engine,
        candidates: &'p [Part],
    ) -> Vec<&'p Part> {
        let direct = resolve_direct(
            &engine.id,
            candidates.iter().map(|p| p.id.as_str()),
            self.mappings,
        );

        candidates
            .iter()
            .filter(|p| p.is_active)
            .filter(|part| {
                let fit = direct.get(&part.id);
                if fit.map_or(false, |f| f.level == CompatibilityLevel::DirectFit) {
                    return true;
                }
                !self.rules.iter().any(|compiled| {
                    let rule = compiled.rule;
                    if rule.source_category != RuleSource::Engine
                        || rule.target_category != part.category
                    {
                        return false;
                    }
                    let result = match_parsed(
                        rule,
                        &compiled.condition,
                        Subject::Engine(engine),
                        Subject::Part(*part),
                        &self.options.matching,
                    );
                    let severity = match fit {
                        Some(f) => f.adjust(rule.severity),
                        None => Some(rule.severity),
                    };
                    result.matched && severity == Some(Severity::Error)
                })
            })
            .collect()
    }
}

/// Evaluate a build against a rule set and mapping set with default options
pub fn evaluate_compatibility(
    power: Option<&PowerSource>,
    parts: &[Part],
    rules: &[Rule],
    mappings: &[DirectMapping],
) -> Vec<CompatibilityWarning> {
    Evaluator::new(rules, mappings).evaluate(power, parts)
}

/// Candidates compatible with `engine` under default options
pub fn compatible_parts<'p>(
    engine: &Engine,
    candidates: &'p [Part],
    rules: &[Rule],
    mappings: &[DirectMapping],
) -> Vec<&'p Part> {
    Evaluator::new(rules, mappings).compatible_parts(engine, candidates)
}

fn sources_for<'a>(
    source: RuleSource,
    power: Option<&'a PowerSource>,
    parts: &[&'a Part],
) -> Vec<Subject<'a>> {
    match source {
        RuleSource::Engine => power
            .and_then(PowerSource::engine)
            .map(Subject::Engine)
            .into_iter()
            .collect(),
        RuleSource::Motor => power
            .and_then(PowerSource::motor)
            .map(Subject::Motor)
            .into_iter()
            .collect(),
        RuleSource::Part(category) => parts
            .iter()
            .filter(|p| p.category == category)
            .map(|p| Subject::Part(*p))
            .collect(),
    }
}

/// First occurrence of each part id, in selection order
fn unique_parts(parts: &[Part]) -> Vec<&Part> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(parts.len());
    for part in parts {
        if seen.insert(part.id.as_str()) {
            unique.push(part);
        } else {
            tracing::warn!(part_id = %part.id, "part selected more than once; evaluating it once");
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::motor::Motor;
    use crate::entities::part::PartCategory;
    use serde_json::json;

    fn shaft_rule() -> Rule {
        Rule::new(
            "r-shaft",
            RuleSource::Engine,
            PartCategory::Clutch,
            json!({
                "op": "mismatch",
                "source_field": "shaft_diameter",
                "target_field": "bore_in",
                "tolerance": 0.01
            }),
            "Shaft diameter mismatch: engine {source_value}\" vs clutch bore {target_value}\"",
            Severity::Error,
        )
    }

    fn engine(shaft: f64) -> PowerSource {
        PowerSource::Engine(Engine::new("e1", "Predator 420", 13.0, shaft))
    }

    fn clutch(bore: f64) -> Part {
        Part::new("c1", "Max-Torque Clutch", PartCategory::Clutch).with_spec("bore_in", bore)
    }

    fn quiet() -> EvaluatorOptions {
        EvaluatorOptions {
            advisories: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_selection_is_empty() {
        let rules = vec![shaft_rule()];
        assert!(evaluate_compatibility(None, &[], &rules, &[]).is_empty());
    }

    #[test]
    fn test_compatible_build_has_no_errors() {
        let rules = vec![shaft_rule()];
        let power = engine(0.75);
        let warnings = evaluate_compatibility(Some(&power), &[clutch(0.75)], &rules, &[]);
        assert!(!has_incompatibilities(&warnings));
    }

    #[test]
    fn test_incompatible_build_single_error() {
        let rules = vec![shaft_rule()];
        let power = engine(1.0);
        let warnings = evaluate_compatibility(Some(&power), &[clutch(0.75)], &rules, &[]);
        let errors: Vec<_> = warnings.iter().filter(|w| w.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("1\""));
        assert!(errors[0].message.contains("0.75\""));
        assert_eq!(errors[0].source, "Predator 420");
        assert_eq!(errors[0].target, "Max-Torque Clutch");
        assert_eq!(errors[0].rule_id.as_deref(), Some("r-shaft"));
    }

    #[test]
    fn test_each_matching_rule_reports_in_rule_order() {
        let mut info = shaft_rule();
        info.id = "r-shaft-note".to_string();
        info.severity = Severity::Info;
        let rules = vec![info, shaft_rule()];
        let power = engine(1.0);
        let warnings = Evaluator::new(&rules, &[])
            .with_options(quiet())
            .evaluate(Some(&power), &[clutch(0.75)]);
        let ids: Vec<_> = warnings.iter().map(|w| w.rule_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("r-shaft-note"), Some("r-shaft")]);
        assert_eq!(warnings[0].message, warnings[1].message);
    }

    #[test]
    fn test_inactive_rules_ignored() {
        let mut rule = shaft_rule();
        rule.is_active = false;
        let rules = vec![rule];
        let power = engine(1.0);
        let warnings = Evaluator::new(&rules, &[])
            .with_options(quiet())
            .evaluate(Some(&power), &[clutch(0.75)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_rule_skipped_others_run() {
        let mut broken = shaft_rule();
        broken.id = "r-broken".to_string();
        broken.condition = json!({ "op": "teleport" });
        let rules = vec![broken, shaft_rule()];
        let evaluator = Evaluator::new(&rules, &[]).with_options(quiet());
        assert_eq!(evaluator.skipped().len(), 1);
        assert_eq!(evaluator.skipped()[0].rule_id(), "r-broken");

        let power = engine(1.0);
        let warnings = evaluator.evaluate(Some(&power), &[clutch(0.75)]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_direct_fit_suppresses_error() {
        let rules = vec![shaft_rule()];
        let mappings = vec![DirectMapping::new("e1", "c1", CompatibilityLevel::DirectFit)];
        let power = engine(1.0);
        let warnings = evaluate_compatibility(Some(&power), &[clutch(0.75)], &rules, &mappings);
        assert!(!warnings
            .iter()
            .any(|w| w.is_error() && w.target == "Max-Torque Clutch"));
    }

    #[test]
    fn test_requires_modification_downgrades() {
        let rules = vec![shaft_rule()];
        let mappings = vec![DirectMapping::new(
            "e1",
            "c1",
            CompatibilityLevel::RequiresModification,
        )];
        let power = engine(1.0);
        let warnings = Evaluator::new(&rules, &mappings)
            .with_options(quiet())
            .evaluate(Some(&power), &[clutch(0.75)]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert_eq!(warnings[0].rule_id.as_deref(), Some("r-shaft"));
    }

    #[test]
    fn test_requires_modification_note_without_rule() {
        let mappings = vec![DirectMapping::new(
            "e1",
            "c1",
            CompatibilityLevel::RequiresModification,
        )];
        let power = engine(0.75);
        let warnings = Evaluator::new(&[], &mappings)
            .with_options(quiet())
            .evaluate(Some(&power), &[clutch(0.75)]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert!(warnings[0].rule_id.is_none());
    }

    #[test]
    fn test_all_severities_reachable() {
        let rules = vec![shaft_rule()];
        let mut adapter = DirectMapping::new("e1", "c1", CompatibilityLevel::AdapterRequired);
        adapter.notes = Some("Bushing kit required".to_string());
        let mappings = vec![adapter];
        let power = engine(1.0);
        let tc = Part::new("tc1", "Comet TAV2", PartCategory::TorqueConverter);
        let warnings = evaluate_compatibility(Some(&power), &[clutch(0.75), tc], &rules, &mappings);

        let severities: HashSet<Severity> = warnings.iter().map(|w| w.severity).collect();
        assert!(severities.contains(&Severity::Error));
        assert!(severities.contains(&Severity::Warning));
        assert!(severities.contains(&Severity::Info));
        assert!(warnings
            .iter()
            .any(|w| w.severity == Severity::Info && w.message == "Bushing kit required"));
    }

    #[test]
    fn test_deterministic() {
        let rules = vec![shaft_rule()];
        let power = engine(1.0);
        let parts = vec![clutch(0.75), Part::new("ch", "Chain", PartCategory::Chain)];
        let first = evaluate_compatibility(Some(&power), &parts, &rules, &[]);
        let second = evaluate_compatibility(Some(&power), &parts, &rules, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_part_to_part_rule_pairs_every_selection() {
        let rule = Rule::new(
            "r-pitch",
            RuleSource::Part(PartCategory::Chain),
            PartCategory::Sprocket,
            json!({ "op": "mismatch", "source_field": "pitch", "target_field": "pitch" }),
            "{source} is {source_value}, {target} is {target_value}",
            Severity::Error,
        );
        let rules = vec![rule];
        let parts = vec![
            Part::new("ch", "Chain #35", PartCategory::Chain).with_spec("pitch", "#35"),
            Part::new("s1", "Clutch Sprocket", PartCategory::Sprocket).with_spec("pitch", "#35"),
            Part::new("s2", "Axle Sprocket", PartCategory::Sprocket).with_spec("pitch", "#40"),
        ];
        let warnings = Evaluator::new(&rules, &[])
            .with_options(quiet())
            .evaluate(None, &parts);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "Chain #35 is #35, Axle Sprocket is #40");
    }

    #[test]
    fn test_motor_rules_need_motor() {
        let rule = Rule::new(
            "r-volt",
            RuleSource::Motor,
            PartCategory::Battery,
            json!({ "op": "mismatch", "source_field": "voltage", "target_field": "voltage" }),
            "Voltage mismatch",
            Severity::Error,
        );
        let rules = vec![rule];
        let battery = Part::new("b1", "72V Pack", PartCategory::Battery).with_spec("voltage", 72);

        let gas = engine(0.75);
        let evaluator = Evaluator::new(&rules, &[]).with_options(quiet());
        assert!(evaluator.evaluate(Some(&gas), &[battery.clone()]).is_empty());

        let ev = PowerSource::Motor(Motor::new("m1", "48V Motor", 48.0, 3.0));
        assert_eq!(evaluator.evaluate(Some(&ev), &[battery]).len(), 1);
    }

    #[test]
    fn test_duplicate_selection_evaluated_once() {
        let rules = vec![shaft_rule()];
        let power = engine(1.0);
        let warnings = Evaluator::new(&rules, &[])
            .with_options(quiet())
            .evaluate(Some(&power), &[clutch(0.75), clutch(0.75)]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sort_by_severity_is_stable() {
        let mut warnings = vec![
            CompatibilityWarning::new(Severity::Info, "a", "b", "i1"),
            CompatibilityWarning::new(Severity::Error, "a", "b", "e1"),
            CompatibilityWarning::new(Severity::Info, "a", "b", "i2"),
            CompatibilityWarning::new(Severity::Warning, "a", "b", "w1"),
        ];
        sort_by_severity(&mut warnings);
        let order: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(order, vec!["e1", "w1", "i1", "i2"]);
    }

    #[test]
    fn test_compatible_parts() {
        let rules = vec![shaft_rule()];
        let mappings = vec![DirectMapping::new("e1", "c-mapped", CompatibilityLevel::DirectFit)];
        let eng = Engine::new("e1", "Predator 420", 13.0, 1.0);
        let candidates = vec![
            Part::new("c-fit", "1in Clutch", PartCategory::Clutch).with_spec("bore_in", 1.0),
            Part::new("c-small", "3/4 Clutch", PartCategory::Clutch).with_spec("bore_in", 0.75),
            Part::new("c-mapped", "Mapped Clutch", PartCategory::Clutch).with_spec("bore_in", 0.75),
            Part::new("c-unknown", "Unlisted Clutch", PartCategory::Clutch),
        ];
        let evaluator = Evaluator::new(&rules, &mappings);
        let ids: Vec<&str> = evaluator
            .compatible_parts(&eng, &candidates)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c-fit", "c-mapped", "c-unknown"]);
    }
}
