//! Integration tests for the KBT CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd against
//! a small catalog written to a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENGINES: &str = r#"
- id: predator-212
  name: Predator 212
  brand: Harbor Freight
  horsepower: 6.5
  torque: 8.1
  shaft_diameter: 0.75
  weight_lbs: 37
  price: 149.99
"#;

const MOTORS: &str = r#"
- id: mx-48
  name: MX 48V Motor
  voltage: 48
  power_kw: 3
  horsepower: 4.0
  torque_lbft: 6
  price: 300
"#;

const PARTS: &str = r##"
- id: clutch-34
  name: 3/4in Clutch
  category: clutch
  price: 54.99
  specifications:
    bore_diameter: 0.75
    teeth: 12
- id: clutch-1in
  name: 1in Clutch
  category: clutch
  price: 49.99
  specifications:
    bore_diameter: 1.0
    teeth: 10
- id: chain-35
  name: "#35 Chain"
  category: chain
  price: 20
  specifications:
    pitch: "#35"
- id: sprocket-60
  name: 60T Sprocket
  category: sprocket
  price: 25
  specifications:
    pitch: "#35"
    teeth: 60
    position: axle
- id: tc-30
  name: TAV2 30 Series
  category: torque_converter
  price: 100
  specifications:
    bore_diameter: 0.75
- id: battery-36
  name: 36V Pack
  category: battery
  price: 180
  specifications:
    voltage: 36
"##;

const RULES: &str = r#"
- id: clutch-needs-teeth
  rule_type: gearing
  source_category: engine
  target_category: clutch
  condition: { op: missing, field: teeth }
  warning_message: "{target} has no tooth count listed"
  severity: info
"#;

const MAPPINGS: &str = r#"
- engine_id: predator-212
  part_id: tc-30
  compatibility_level: requires_modification
  notes: Needs a keyway spacer
"#;

/// Helper to get a kbt command
fn kbt() -> Command {
    Command::cargo_bin("kbt").unwrap()
}

/// Helper to create a catalog with builds in a temp directory
fn setup_catalog() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("engines.yaml"), ENGINES).unwrap();
    fs::write(root.join("motors.yaml"), MOTORS).unwrap();
    fs::write(root.join("parts.yaml"), PARTS).unwrap();
    fs::write(root.join("rules.yaml"), RULES).unwrap();
    fs::write(root.join("mappings.yaml"), MAPPINGS).unwrap();

    write_build(
        root,
        "good.yaml",
        "name: Good Build\nengine: predator-212\nparts:\n  clutch: clutch-34\n  chain: chain-35\n  sprocket: sprocket-60\n",
    );
    write_build(
        root,
        "bad.yaml",
        "name: Bad Build\nengine: predator-212\nparts:\n  clutch: clutch-1in\n",
    );
    write_build(
        root,
        "electric.yaml",
        "name: Volt\nmotor: mx-48\nparts:\n  battery: battery-36\n",
    );
    tmp
}

fn write_build(root: &Path, name: &str, contents: &str) {
    fs::write(root.join(name), contents).unwrap();
}

/// Run kbt against the temp catalog
fn kbt_in(tmp: &TempDir) -> Command {
    let mut cmd = kbt();
    cmd.current_dir(tmp.path())
        .arg("--catalog")
        .arg(tmp.path())
        .env_remove("KBT_TOLERANCE")
        .env_remove("KBT_CACHE_TTL_SECS")
        .env_remove("KBT_BASE_KART_WEIGHT")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    kbt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kart Build Toolkit"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("compatible"));

    kbt()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kart Build Toolkit"));
}

#[test]
fn test_version_displays() {
    kbt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kbt"));
}

#[test]
fn test_missing_catalog_fails() {
    kbt()
        .args(["--catalog", "/nonexistent/catalog", "rules"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog directory not found"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_compatible_build() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["check", "good.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Good Build has no compatibility issues"));
}

#[test]
fn test_check_reports_shaft_mismatch() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["check", "bad.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Shaft diameter mismatch: Predator 212 has a 0.75\" shaft, but 1in Clutch bore is 1\"",
        ))
        .stdout(predicate::str::contains("incompatible"));
}

#[test]
fn test_check_strict_fails_on_errors() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["check", "bad.yaml", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incompatibilit"));

    kbt_in(&tmp)
        .args(["check", "good.yaml", "--strict"])
        .assert()
        .success();
}

#[test]
fn test_check_json_output() {
    let tmp = setup_catalog();
    let output = kbt_in(&tmp)
        .args(["--format", "json", "check", "bad.yaml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["compatible"], false);
    assert_eq!(report["errors"], 1);
    let issues = report["issues"].as_array().unwrap();
    assert_eq!(issues[0]["type"], "error");
    assert_eq!(issues[0]["source"], "Predator 212");
    assert_eq!(issues[0]["target"], "1in Clutch");
}

#[test]
fn test_check_mapping_note_and_drive_advisory() {
    let tmp = setup_catalog();
    write_build(
        tmp.path(),
        "tc.yaml",
        "name: TC Build\nengine: predator-212\nparts:\n  torque_converter: tc-30\n",
    );
    write_build(tmp.path(), "bare.yaml", "name: Bare\nengine: predator-212\n");

    kbt_in(&tmp)
        .args(["check", "tc.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Needs a keyway spacer"));

    kbt_in(&tmp)
        .args(["check", "bare.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drive System"));

    kbt_in(&tmp)
        .args(["check", "bare.yaml", "--no-advisories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no compatibility issues"));
}

#[test]
fn test_check_electric_voltage_mismatch() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["check", "electric.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Voltage mismatch: MX 48V Motor runs at 48V"));
}

#[test]
fn test_check_unknown_ids_are_skipped() {
    let tmp = setup_catalog();
    write_build(
        tmp.path(),
        "ghost.yaml",
        "name: Ghost\nengine: predator-212\nparts:\n  clutch: [clutch-34, no-such-part]\n",
    );
    kbt_in(&tmp)
        .args(["check", "ghost.yaml"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown part id"));
}

#[test]
fn test_check_missing_build_file() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["check", "nope.yaml"])
        .assert()
        .failure();
}

#[test]
fn test_builtin_rules_can_be_disabled() {
    let tmp = setup_catalog();
    fs::write(tmp.path().join("kbt.yaml"), "builtin_rules: false\n").unwrap();
    kbt_in(&tmp)
        .args(["check", "bad.yaml", "--strict"])
        .assert()
        .success();
}

// ============================================================================
// metrics
// ============================================================================

#[test]
fn test_metrics_json() {
    let tmp = setup_catalog();
    let output = kbt_in(&tmp)
        .args(["--format", "json", "metrics", "good.yaml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let metrics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metrics["power_type"], "gas");
    assert_eq!(metrics["total_hp"], 6.5);
    assert_eq!(metrics["gear_ratio"], 5.0);
    assert!(metrics["top_speed_mph"].is_null());
    assert_eq!(metrics["total_weight_lbs"], 37.0);
    assert_eq!(metrics["tier"]["tier"], "mid-range");
    assert_eq!(metrics["tier"]["sprockets"], "12T + 72T");
}

#[test]
fn test_metrics_summary() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["metrics", "good.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Performance: Good Build"))
        .stdout(predicate::str::contains("5.00:1"))
        .stdout(predicate::str::contains("Mid-Range"));
}

#[test]
fn test_metrics_electric_has_no_gear_ratio() {
    let tmp = setup_catalog();
    let output = kbt_in(&tmp)
        .args(["--format", "json", "metrics", "electric.yaml"])
        .output()
        .unwrap();
    let metrics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metrics["power_type"], "electric");
    assert!(metrics["gear_ratio"].is_null());
    assert_eq!(metrics["tier"]["battery"], "10-15 Ah");
}

// ============================================================================
// cost
// ============================================================================

#[test]
fn test_cost_selected_parts() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["cost", "good.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: $249.98"))
        .stdout(predicate::str::contains("approximate"));
}

#[test]
fn test_cost_full_build_adds_placeholders() {
    let tmp = setup_catalog();
    let output = kbt_in(&tmp)
        .args(["--format", "json", "cost", "good.yaml", "--full"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let cost: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cost["mode"], "full_build");
    assert_eq!(cost["total"], 629.98);
    let labels: Vec<&str> = cost["placeholders"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["label"].as_str())
        .collect();
    assert_eq!(labels, vec!["Frame", "Wheels & Tires", "Brakes", "Hardware"]);
}

#[test]
fn test_cost_budget() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["cost", "good.yaml", "--budget", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("over budget by $49.98"));

    kbt_in(&tmp)
        .args(["cost", "good.yaml", "--budget", "200", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("over budget"));

    kbt_in(&tmp)
        .args(["cost", "good.yaml", "--budget", "1000", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("under budget"));
}

// ============================================================================
// rules
// ============================================================================

#[test]
fn test_rules_lists_builtin_and_catalog() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("clutch-needs-teeth"))
        .stdout(predicate::str::contains("builtin:shaft-clutch-bore"));
}

#[test]
fn test_rules_filters() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["rules", "--no-builtin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clutch-needs-teeth"))
        .stdout(predicate::str::contains("builtin:").not());

    let output = kbt_in(&tmp)
        .args(["--format", "json", "rules", "--source", "motor"])
        .output()
        .unwrap();
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().all(|r| r["source_category"] == "motor"));
}

#[test]
fn test_rules_writes_cache() {
    let tmp = setup_catalog();
    kbt_in(&tmp).arg("rules").assert().success();
    assert!(tmp.path().join(".kbt/rule-cache.json").exists());

    let other = setup_catalog();
    kbt_in(&other).args(["--no-cache", "rules"]).assert().success();
    assert!(!other.path().join(".kbt/rule-cache.json").exists());
}

// ============================================================================
// compatible
// ============================================================================

#[test]
fn test_compatible_excludes_mismatched_bore() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["compatible", "--engine", "predator-212", "--category", "clutch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clutch-34"))
        .stdout(predicate::str::contains("clutch-1in").not());
}

#[test]
fn test_compatible_shows_mapping_level() {
    let tmp = setup_catalog();
    let output = kbt_in(&tmp)
        .args([
            "--format",
            "json",
            "compatible",
            "--engine",
            "predator-212",
            "--category",
            "torque_converter",
        ])
        .output()
        .unwrap();
    let parts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parts[0]["id"], "tc-30");
    assert_eq!(parts[0]["compatibility_level"], "requires_modification");
}

#[test]
fn test_compatible_unknown_engine() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["compatible", "--engine", "v-twin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown engine"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_clean_catalog() {
    let tmp = setup_catalog();
    kbt_in(&tmp)
        .args(["validate", "good.yaml", "bad.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation Summary"))
        .stdout(predicate::str::contains("Catalog passed validation"));
}

#[test]
fn test_validate_reports_bad_rows_and_rules() {
    let tmp = setup_catalog();
    let rules = format!(
        "{}\n- id: broken-op\n  source_category: engine\n  target_category: clutch\n  condition: {{ op: bogus, field: teeth }}\n  warning_message: never\n- id: no-target\n  source_category: engine\n  warning_message: oops\n",
        RULES
    );
    fs::write(tmp.path().join("rules.yaml"), rules).unwrap();

    kbt_in(&tmp)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken-op"))
        .stdout(predicate::str::contains("no-target"))
        .stdout(predicate::str::contains("Add `target_category` to this row"))
        .stderr(predicate::str::contains("Validation failed: 2 problems found"));
}

#[test]
fn test_validate_strict_build_warnings() {
    let tmp = setup_catalog();
    write_build(
        tmp.path(),
        "ghost.yaml",
        "name: Ghost\nengine: predator-212\nparts:\n  clutch: no-such-part\n",
    );
    kbt_in(&tmp)
        .args(["validate", "ghost.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown part no-such-part"));

    kbt_in(&tmp)
        .args(["validate", "ghost.yaml", "--strict"])
        .assert()
        .failure();
}

// ============================================================================
// completions
// ============================================================================

#[test]
fn test_completions_bash() {
    kbt()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kbt"));
}
