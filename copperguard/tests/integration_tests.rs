//! Integration tests for the CopperGuard file-level API

use copperguard::prelude::*;
use copperguard::RunOutcome;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_single_via_below_minimum() {
    let report = DrcCore::check_files(
        &fixture_path("single_via.json"),
        Some(&fixture_path("annular_rules.json")),
        None,
    )
    .expect("fixtures should load");

    assert_eq!(report.summary.outcome(), RunOutcome::Violations(1));
    let v = &report.violations[0];
    assert_eq!(v.code, ErrorCode::AnnularWidth);
    assert_eq!(v.items, vec!["via-1"]);
    assert_eq!(v.layer.as_deref(), Some("F.Cu"));
    assert!((v.measured.unwrap() - 0.15).abs() < 1e-9);
    assert_eq!(v.rule.as_deref(), Some("min_ring"));
}

#[test]
fn test_no_rules_runs_nothing() {
    let report = DrcCore::check_files(&fixture_path("single_via.json"), None, None).unwrap();

    assert!(report.summary.completed);
    assert_eq!(report.summary.outcome(), RunOutcome::Clean);
    assert!(report
        .messages
        .iter()
        .any(|m| m == "No annular width constraints found. Tests not run."));
}

#[test]
fn test_mixed_board_against_fab_rules() {
    let report = DrcCore::check_files(
        &fixture_path("mixed_board.json"),
        Some(&fixture_path("fab_rules.json")),
        None,
    )
    .unwrap();

    let summary = &report.summary;
    assert!(summary.completed);
    assert_eq!(summary.total, 5, "violations: {:#?}", report.violations);
    assert_eq!(summary.count(ErrorCode::TrackWidth), 2);
    assert_eq!(summary.count(ErrorCode::AnnularWidth), 1);
    assert_eq!(summary.count(ErrorCode::Clearance), 2);
    assert_eq!(summary.count(ErrorCode::ViaDiameter), 0);
    assert_eq!(summary.count(ErrorCode::DrillOutOfRange), 0);

    let stats = report.stats();
    assert_eq!(stats.errors, 4);
    assert_eq!(stats.warnings, 1);
    assert!(report.has_errors());

    let narrow = report
        .violations
        .iter()
        .find(|v| v.items == vec!["trace-gnd"])
        .expect("narrow GND trace is reported");
    assert!(narrow.message.contains("board setup constraints"));

    let power = report
        .violations
        .iter()
        .find(|v| v.items == vec!["trace-5v"])
        .expect("power trace is reported");
    assert_eq!(power.severity, Severity::Warning);
    assert_eq!(power.rule.as_deref(), Some("Power Width"));
}

#[test]
fn test_check_is_idempotent() {
    let run = || {
        DrcCore::check_files(
            &fixture_path("mixed_board.json"),
            Some(&fixture_path("fab_rules.json")),
            None,
        )
        .unwrap()
        .violations
    };

    assert_eq!(run(), run());
}

#[test]
fn test_options_override_rule_settings() {
    let options = DrcOptions {
        providers: vec!["track_width".to_string()],
        ..DrcOptions::default()
    };
    let report = DrcCore::check_files(
        &fixture_path("mixed_board.json"),
        Some(&fixture_path("fab_rules.json")),
        Some(options),
    )
    .unwrap();

    assert_eq!(report.summary.providers_run, vec!["track_width"]);
    assert_eq!(report.total_violations(), 2);
}

#[test]
fn test_invalid_board_rejected() {
    let result = DrcCore::check_files(&fixture_path("invalid_board.json"), None, None);
    assert!(matches!(result, Err(DrcError::Board(_))));
}

#[test]
fn test_missing_file() {
    let result = DrcCore::check_files(&fixture_path("does_not_exist.json"), None, None);
    assert!(matches!(result, Err(DrcError::Io(_))));
}

#[test]
fn test_malformed_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();

    let result = DrcCore::check_files(&fixture_path("single_via.json"), Some(&path), None);
    assert!(matches!(result, Err(DrcError::Json(_))));
}

#[test]
fn test_sample_rules_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.json");
    let json = serde_json::to_string_pretty(&copperguard::generate_sample_rules()).unwrap();
    std::fs::write(&path, json).unwrap();

    let report = DrcCore::check_files(&fixture_path("mixed_board.json"), Some(&path), None).unwrap();
    assert!(report.summary.completed);
    assert_eq!(report.rule_set, "Standard Fabrication Rules");
}
