//! Built-in rule set
//!
//! Physical fit checks every catalog needs. They are ordinary [`Rule`] data
//! and run through the same evaluator as catalog rules; `builtin_rules = false`
//! in the config turns them off.

use serde_json::json;

use crate::entities::part::PartCategory;
use crate::entities::rule::{Rule, RuleSource, Severity};

/// Id prefix for built-in rules
pub const BUILTIN_PREFIX: &str = "builtin:";

fn rule(
    name: &str,
    source: RuleSource,
    target: PartCategory,
    condition: serde_json::Value,
    message: &str,
    severity: Severity,
) -> Rule {
    Rule::new(
        format!("{}{}", BUILTIN_PREFIX, name),
        source,
        target,
        condition,
        message,
        severity,
    )
    .with_type("builtin")
}

pub fn builtin_rules() -> Vec<Rule> {
    let shaft_bore = json!({
        "op": "mismatch",
        "source_field": "shaft_diameter",
        "target_field": "bore_diameter",
    });
    let mut rules = vec![
        rule(
            "shaft-clutch-bore",
            RuleSource::Engine,
            PartCategory::Clutch,
            shaft_bore.clone(),
            "Shaft diameter mismatch: {source} has a {source_value}\" shaft, but {target} bore is {target_value}\"",
            Severity::Error,
        ),
        rule(
            "shaft-converter-bore",
            RuleSource::Engine,
            PartCategory::TorqueConverter,
            shaft_bore,
            "Shaft diameter mismatch: {source} has a {source_value}\" shaft, but {target} bore is {target_value}\"",
            Severity::Error,
        ),
        rule(
            "chain-sprocket-pitch",
            RuleSource::Part(PartCategory::Chain),
            PartCategory::Sprocket,
            json!({ "op": "mismatch", "source_field": "pitch", "target_field": "pitch" }),
            "Chain pitch mismatch: {source} is {source_value} but {target} is {target_value}",
            Severity::Error,
        ),
        rule(
            "brake-axle-diameter",
            RuleSource::Part(PartCategory::Brake),
            PartCategory::Axle,
            json!({
                "op": "mismatch",
                "source_field": "axle_diameter",
                "target_field": "diameter",
                "tolerance": 0.01,
            }),
            "Axle diameter mismatch: {source} fits a {source_value}\" axle, but {target} is {target_value}\"",
            Severity::Error,
        ),
        rule(
            "wheel-axle-bolt-pattern",
            RuleSource::Part(PartCategory::Wheel),
            PartCategory::Axle,
            json!({ "op": "mismatch", "source_field": "bolt_pattern", "target_field": "bolt_pattern" }),
            "Bolt pattern mismatch: {source} uses {source_value}, {target} hub is {target_value}",
            Severity::Warning,
        ),
    ];

    for tire in [PartCategory::Tire, PartCategory::TireFront, PartCategory::TireRear] {
        rules.push(rule(
            &format!("{}-wheel-diameter", tire.as_str().replace('_', "-")),
            RuleSource::Part(tire),
            PartCategory::Wheel,
            json!({ "op": "mismatch", "source_field": "wheel_diameter", "target_field": "diameter" }),
            "Wheel size mismatch: {source} needs a {source_value}\" wheel, but {target} is {target_value}\"",
            Severity::Error,
        ));
    }

    for target in [
        PartCategory::Battery,
        PartCategory::MotorController,
        PartCategory::Charger,
    ] {
        rules.push(rule(
            &format!("motor-{}-voltage", target.as_str().replace('_', "-")),
            RuleSource::Motor,
            target,
            json!({ "op": "mismatch", "source_field": "voltage", "target_field": "voltage" }),
            "Voltage mismatch: {source} runs at {source_value}V, but {target} is {target_value}V",
            Severity::Error,
        ));
    }

    rules
}

pub fn is_builtin(rule: &Rule) -> bool {
    rule.id.starts_with(BUILTIN_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::condition::Condition;
    use crate::compat::evaluator::{has_incompatibilities, Evaluator, EvaluatorOptions};
    use crate::entities::build::PowerSource;
    use crate::entities::engine::Engine;
    use crate::entities::part::Part;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_rules_parse_and_are_unique() {
        let rules = builtin_rules();
        let mut ids = HashSet::new();
        for rule in &rules {
            assert!(Condition::parse(rule).is_ok(), "{} should parse", rule.id);
            assert!(ids.insert(rule.id.clone()), "duplicate id {}", rule.id);
            assert!(is_builtin(rule));
        }
    }

    #[test]
    fn test_predator_212_with_one_inch_clutch() {
        let rules = builtin_rules();
        let evaluator = Evaluator::new(&rules, &[]).with_options(EvaluatorOptions {
            advisories: false,
            ..Default::default()
        });
        let power = PowerSource::Engine(Engine::new("e212", "Predator 212", 6.5, 0.75));
        let clutch = Part::new("c1", "1in Clutch", PartCategory::Clutch).with_spec("bore_diameter", 1.0);

        let warnings = evaluator.evaluate(Some(&power), &[clutch]);
        assert!(has_incompatibilities(&warnings));
        assert_eq!(
            warnings[0].message,
            "Shaft diameter mismatch: Predator 212 has a 0.75\" shaft, but 1in Clutch bore is 1\""
        );
    }

    #[test]
    fn test_tire_wheel_sizes() {
        let rules = builtin_rules();
        let evaluator = Evaluator::new(&rules, &[]);
        let parts = vec![
            Part::new("t1", "10in Tire", PartCategory::TireFront).with_spec("wheel_diameter", 5),
            Part::new("w1", "6in Wheel", PartCategory::Wheel).with_spec("diameter", 6),
        ];
        let warnings = evaluator.evaluate(None, &parts);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].rule_id.as_deref(), Some("builtin:tire-front-wheel-diameter"));
    }
}
