//! Build-level advisories that depend on what is selected, not on part specs

use crate::compat::evaluator::CompatibilityWarning;
use crate::entities::build::PowerSource;
use crate::entities::part::{Part, PartCategory};
use crate::entities::rule::Severity;

pub const MISSING_DRIVE_MESSAGE: &str = "Consider adding a clutch or torque converter for power transfer";
pub const DOUBLE_DRIVE_MESSAGE: &str =
    "You have both a clutch and torque converter selected. Usually only one is needed.";

/// Advisories for the current selection.
///
/// - An engine with neither clutch nor torque converter gets an info note
/// - A clutch together with a torque converter gets a warning
pub fn selection_advisories(power: Option<&PowerSource>, parts: &[&Part]) -> Vec<CompatibilityWarning> {
    let mut out = Vec::new();

    let clutch = parts.iter().find(|p| p.category == PartCategory::Clutch);
    let converter = parts
        .iter()
        .find(|p| p.category == PartCategory::TorqueConverter);

    if let Some(engine) = power.and_then(PowerSource::engine) {
        if clutch.is_none() && converter.is_none() {
            out.push(CompatibilityWarning::new(
                Severity::Info,
                &engine.name,
                "Drive System",
                MISSING_DRIVE_MESSAGE,
            ));
        }
    }

    if let (Some(c), Some(tc)) = (clutch, converter) {
        out.push(CompatibilityWarning::new(
            Severity::Warning,
            &c.name,
            &tc.name,
            DOUBLE_DRIVE_MESSAGE,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::engine::Engine;
    use crate::entities::motor::Motor;

    #[test]
    fn test_engine_without_drive_gets_info() {
        let power = PowerSource::Engine(Engine::new("e1", "Predator 212", 6.5, 0.75));
        let notes = selection_advisories(Some(&power), &[]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Info);
        assert_eq!(notes[0].message, MISSING_DRIVE_MESSAGE);
    }

    #[test]
    fn test_motor_needs_no_clutch() {
        let power = PowerSource::Motor(Motor::new("m1", "Hub Motor", 48.0, 2.0));
        assert!(selection_advisories(Some(&power), &[]).is_empty());
    }

    #[test]
    fn test_clutch_and_converter_warns() {
        let clutch = Part::new("c1", "Clutch", PartCategory::Clutch);
        let tc = Part::new("t1", "TAV2", PartCategory::TorqueConverter);
        let notes = selection_advisories(None, &[&clutch, &tc]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Warning);
        assert_eq!(notes[0].source, "Clutch");
        assert_eq!(notes[0].target, "TAV2");
    }
}
