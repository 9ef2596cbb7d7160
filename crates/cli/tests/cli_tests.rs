//! CLI integration tests

use std::process::Command;

fn eta(args: &[&str]) -> std::process::Output {
    let model = concat!(env!("CARGO_MANIFEST_DIR"), "/../../models/best_model.json");
    Command::new("cargo")
        .args(["run", "-q", "-p", "eta-cli", "--"])
        .args(args)
        .env("ETA_MODEL_PATH", model)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = eta(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Delivery ETA"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("options"), "Should show options command");
    assert!(stdout.contains("fields"), "Should show fields command");
    assert!(stdout.contains("inspect"), "Should show inspect command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = eta(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("eta"), "Should show binary name");
}

/// Test predict subcommand help lists one flag per field
#[test]
fn test_predict_help() {
    let output = eta(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in [
        "--distance-km",
        "--weather",
        "--traffic-level",
        "--time-of-day",
        "--vehicle-type",
        "--preparation-time-min",
        "--courier-experience-yrs",
    ] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test options listing as JSON
#[test]
fn test_options_json() {
    let output = eta(&["options", "--format", "json"]);
    assert!(output.status.success(), "Options should succeed");

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0]["label"], "Clear ☀️");
    assert_eq!(rows[0]["value"], "Clear");
}

/// Test a prediction against the bundled artifact
#[test]
fn test_predict_json_with_bundled_model() {
    let output = eta(&[
        "predict",
        "--format",
        "json",
        "--distance-km",
        "5.0",
        "--weather",
        "rainy",
        "--vehicle-type",
        "car",
    ]);
    assert!(output.status.success(), "Predict should succeed");

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["model_version"], "linear-2024.11");
    assert!(body["prediction_minutes"].as_f64().unwrap() > 0.0);
    assert_eq!(body["summary"][1], "Weather: Rainy");
}

/// Test that a zero distance is rejected with the validation message
#[test]
fn test_predict_rejects_zero_distance() {
    let output = eta(&["predict", "--distance-km", "0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Zero distance should fail");
    assert!(
        stdout.contains("Distance must be greater than zero.")
            || stderr.contains("Distance must be greater than zero."),
        "Should show validation message"
    );
}

/// Test inspecting the bundled artifact
#[test]
fn test_inspect_json() {
    let output = eta(&["inspect", "--format", "json"]);
    assert!(output.status.success(), "Inspect should succeed");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["model_version"], "linear-2024.11");
    assert_eq!(report["tolerates_unknown_after_load"], true);
    assert_eq!(report["checksum"].as_str().unwrap().len(), 64);
}

/// Test that verbose mode logs the resolved model path to stderr
#[test]
fn test_verbose_logs_model_path() {
    let model = concat!(env!("CARGO_MANIFEST_DIR"), "/../../models/best_model.json");
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "eta-cli", "--", "-v", "predict", "--format", "json"])
        .env("ETA_MODEL_PATH", model)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "Verbose predict should succeed");
    assert!(stderr.contains("Using model artifact"), "Should log the artifact in use");
    assert!(stderr.contains("best_model.json"), "Should log the model path");
}
