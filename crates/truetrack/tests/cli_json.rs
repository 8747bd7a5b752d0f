use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn truetrack_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_truetrack"))
}

fn run_cli(args: &[&str], home: &Path) -> Output {
    Command::new(truetrack_bin())
        .args(args)
        .env("TRUETRACK_HOME", home)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute truetrack CLI")
}

fn parse_json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find(['{', '[']).unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn run_cli_json<T: DeserializeOwned>(args: &[&str], home: &Path) -> T {
    let output = run_cli(args, home);
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_value(parse_json_output(&output)).unwrap_or_else(|err| {
        panic!(
            "failed to deserialize JSON output: {}\nstdout:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn run_cli_json_error(args: &[&str], home: &Path) -> ErrorBody {
    let output = run_cli(args, home);
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}\nstdout:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout)
    );
    let envelope: ErrorEnvelope = serde_json::from_value(parse_json_output(&output))
        .expect("error output has an error envelope");
    envelope.error
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: String,
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    payload: String,
    is_authentic: bool,
    verdict: String,
    product: Product,
}

#[derive(Debug, Deserialize)]
struct Product {
    product_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScanReport {
    session_id: String,
    state: String,
    role: String,
    outcome: Outcome,
    recorded: serde_json::Value,
}

#[test]
fn verify_known_code_is_authentic() {
    let home = TempDir::new().unwrap();
    let outcome: Outcome = run_cli_json(&["verify", "TT-12345", "--json"], home.path());

    assert!(outcome.is_authentic);
    assert_eq!(outcome.verdict, "genuine");
    assert_eq!(outcome.product.product_id, "TT-12345");
    assert_eq!(outcome.product.name, "Paracetamol 500mg");
}

#[test]
fn verify_registered_counterfeit() {
    let home = TempDir::new().unwrap();
    let outcome: Outcome = run_cli_json(&["verify", "TT-12347", "--json"], home.path());

    assert!(!outcome.is_authentic);
    assert_eq!(outcome.verdict, "known_counterfeit");
}

#[test]
fn verify_rejects_foreign_codes() {
    let home = TempDir::new().unwrap();
    let error = run_cli_json_error(&["verify", "https://example.com/x", "--json"], home.path());

    assert_eq!(error.code.as_deref(), Some("invalid_payload"));
    assert!(error.message.contains("Not a TrueTrack code"));
    assert!(!error.suggestions.is_empty());
}

#[test]
fn scan_scripted_counterfeit_as_customer() {
    let home = TempDir::new().unwrap();
    let report: ScanReport = run_cli_json(
        &["scan", "--payload", "TT-12347", "--payload", "TT-12345", "--json"],
        home.path(),
    );

    assert!(!report.session_id.is_empty());
    assert_eq!(report.state, "resulted");
    assert_eq!(report.role, "customer");
    assert_eq!(report.outcome.payload, "TT-12347", "first decoded code wins");
    assert!(!report.outcome.is_authentic);
    assert_eq!(report.recorded["status"], "counterfeit");
}

#[test]
fn scan_as_retailer_records_inventory_and_alert() {
    let home = TempDir::new().unwrap();
    let report: ScanReport = run_cli_json(
        &["scan", "--role", "retailer", "--payload", "TT-002", "--json"],
        home.path(),
    );

    assert_eq!(report.role, "retailer");
    assert_eq!(report.recorded["inventory"]["id"], "TT-002");
    assert_eq!(report.recorded["inventory"]["location"], "Current Store");
    assert_eq!(report.recorded["alert"]["kind"], "counterfeit");
}

#[test]
fn scan_with_simulated_decoder_finds_a_genuine_code() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("config.toml"),
        "[scan]\nframe_interval_ms = 10\nframes_before_decode = 2\n",
    )
    .unwrap();
    let report: ScanReport = run_cli_json(&["scan", "--json"], home.path());

    assert!(report.outcome.payload.starts_with("TT-"));
    assert!(report.outcome.is_authentic);
    assert_eq!(report.outcome.verdict, "genuine");
}

#[test]
fn scan_with_denied_camera_fails() {
    let home = TempDir::new().unwrap();
    let error = run_cli_json_error(&["scan", "--deny-camera", "--json"], home.path());

    assert_eq!(error.code.as_deref(), Some("permission_denied"));
    assert_eq!(
        error.message,
        "Unable to access camera. Please check permissions."
    );
}

#[test]
fn scan_ending_without_a_code_reports_device_unavailable() {
    let home = TempDir::new().unwrap();
    let error = run_cli_json_error(&["scan", "--payload", "", "--json"], home.path());

    assert_eq!(error.code.as_deref(), Some("device_unavailable"));
}

#[test]
fn dashboard_admin_summary() {
    let home = TempDir::new().unwrap();
    let dashboard: serde_json::Value = run_cli_json(&["dashboard", "admin", "--json"], home.path());

    assert_eq!(dashboard["summary"]["total_products"], 125_430);
    assert_eq!(dashboard["summary"]["anomaly_alerts"], 26);
    assert!(dashboard["qr_batches"].as_array().is_some_and(|b| !b.is_empty()));
    assert!(dashboard["anomalies"].is_array());
}

#[test]
fn dashboard_retailer_lists_inventory_and_alerts() {
    let home = TempDir::new().unwrap();
    let dashboard: serde_json::Value =
        run_cli_json(&["dashboard", "retailer", "--json"], home.path());

    assert!(dashboard["inventory"].is_array());
    assert!(dashboard["alerts"].is_array());
}

#[test]
fn journey_has_five_steps() {
    let home = TempDir::new().unwrap();
    let journey: serde_json::Value = run_cli_json(&["journey", "TT-12345", "--json"], home.path());

    assert_eq!(journey["product_id"], "TT-12345");
    let steps = journey["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 5);
    assert_eq!(steps[0]["status"], "completed");
    assert_eq!(steps[4]["status"], "current");
}

#[test]
fn config_reports_defaults_without_a_file() {
    let home = TempDir::new().unwrap();
    let config: serde_json::Value = run_cli_json(&["config", "--json"], home.path());

    assert_eq!(config["config_file"]["exists"], false);
    assert_eq!(config["settings"]["scan"]["facing"], "environment");
    assert_eq!(config["settings"]["camera"]["deny_permission"], false);
}

#[test]
fn malformed_config_is_reported() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("config.toml"), "[scan\nfacing = ").unwrap();
    let error = run_cli_json_error(&["config", "--json"], home.path());

    assert_eq!(error.code.as_deref(), Some("config_invalid"));
}

#[test]
fn audit_trail_records_scan_and_verification() {
    let home = TempDir::new().unwrap();
    let audit = home.path().join("audit").join("trail.ndjson");
    let audit_arg = audit.to_string_lossy().to_string();
    let _: ScanReport = run_cli_json(
        &["--audit", &audit_arg, "scan", "--payload", "TT-12345", "--json"],
        home.path(),
    );

    let text = fs::read_to_string(&audit).expect("audit trail written");
    let events: Vec<String> = text
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).expect("NDJSON record");
            record["event"].as_str().unwrap_or_default().to_string()
        })
        .collect();

    assert_eq!(events.first().map(String::as_str), Some("audit_started"));
    assert_eq!(events.last().map(String::as_str), Some("audit_stopped"));
    for expected in ["session_started", "camera_acquired", "decoded", "camera_released", "verified"] {
        assert!(events.iter().any(|e| e == expected), "missing {} in {:?}", expected, events);
    }
    assert!(!text.contains("TT-12345"), "payload text must not be written");
}
