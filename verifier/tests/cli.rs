//! End-to-end runs of the `guardian-verify` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use guardian_audit::FileChainStore;
use guardian_contracts::{
    event::{CandidateEvent, HarmOverrideReport},
    validation::ValidationReport,
};
use guardian_core::traits::{ChainStore, EventValidator};
use guardian_schema::{SchemaValidator, DEFAULT_SCHEMA_PATH};

const SCHEMA_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../governance/HARM_OVERRIDE_EVENT_SCHEMA.json"
);

/// Lets schema-invalid events onto a well-linked chain.
struct AcceptAll;

impl EventValidator for AcceptAll {
    fn validate(&self, _event: &Value) -> ValidationReport {
        ValidationReport::from_violations(vec![])
    }

    fn validate_candidate(&self, _candidate: &Value) -> ValidationReport {
        ValidationReport::from_violations(vec![])
    }
}

fn report(summary: &str) -> HarmOverrideReport {
    serde_json::from_value(json!({
        "request_context": {
            "channel": "chat",
            "language": "en",
            "user_role": "guardian",
            "subject_role": "child",
            "request_summary": summary
        },
        "risk_assessment": {
            "credible_risk": true,
            "imminence": "imminent",
            "severity": "severe",
            "harm_domains": ["physical"],
            "evidence_signals": ["explicit statement of intent"]
        },
        "override_decision": { "actions_taken": ["escalated to human reviewer"] }
    }))
    .unwrap()
}

/// A schema-conforming log of `n` events; returns the last event hash.
fn write_log(path: &Path, n: usize) -> String {
    let validator = Arc::new(SchemaValidator::from_file(Path::new(SCHEMA_PATH)).unwrap());
    let store = FileChainStore::new(path, validator);
    let mut tip = String::new();
    for i in 0..n {
        let candidate =
            CandidateEvent::from_report(report(&format!("event number {i}")), "v0.2", Utc::now())
                .unwrap();
        tip = store.append(candidate).unwrap().event_hash().to_string();
    }
    tip
}

/// A correctly chained log whose only event does not satisfy the schema.
fn write_schema_invalid_log(path: &Path) {
    let store = FileChainStore::new(path, Arc::new(AcceptAll));
    let candidate =
        CandidateEvent::from_report(HarmOverrideReport::default(), "v0.2", Utc::now()).unwrap();
    store.append(candidate).unwrap();
}

/// A working directory holding the schema at its default relative path.
fn dir_with_default_schema() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join(DEFAULT_SCHEMA_PATH);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::copy(SCHEMA_PATH, target).unwrap();
    dir
}

fn verify(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_guardian-verify"))
        .args(args)
        .current_dir(cwd)
        .env_remove("GUARDIAN_AUDIT_LOG_PATH")
        .env_remove("GUARDIAN_SCHEMA_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn log_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn intact_log_exits_zero_and_prints_the_tip() {
    let dir = dir_with_default_schema();
    let log = dir.path().join("audit_events.jsonl");
    let tip = write_log(&log, 3);

    let out = verify(dir.path(), &[log_arg(&log)]);

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("3 event(s) verified"), "stdout: {stdout}");
    assert!(stdout.contains(&tip), "stdout: {stdout}");
}

#[test]
fn log_path_defaults_to_the_working_directory() {
    let dir = dir_with_default_schema();
    let tip = write_log(&dir.path().join("audit_events.jsonl"), 1);

    let out = verify(dir.path(), &[]);

    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains(&tip));
}

#[test]
fn edited_line_exits_one_and_names_the_line() {
    let dir = dir_with_default_schema();
    let log = dir.path().join("audit_events.jsonl");
    write_log(&log, 3);

    let contents = fs::read_to_string(&log).unwrap();
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    lines[1] = lines[1].replace("event number 1", "event number 9");
    fs::write(&log, lines.iter().map(|l| format!("{l}\n")).collect::<String>()).unwrap();

    let out = verify(dir.path(), &[log_arg(&log)]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("CHAIN BROKEN: line 2"), "stderr: {stderr}");
}

#[test]
fn missing_log_exits_two() {
    let dir = dir_with_default_schema();

    let out = verify(dir.path(), &["no_such_log.jsonl"]);

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not found"));
}

#[test]
fn default_schema_catches_a_well_linked_invalid_event() {
    let dir = dir_with_default_schema();
    let log = dir.path().join("audit_events.jsonl");
    write_schema_invalid_log(&log);

    let out = verify(dir.path(), &[log_arg(&log)]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 1"), "stderr: {stderr}");
    assert!(stderr.contains("schema violation"), "stderr: {stderr}");
}

#[test]
fn no_schema_checks_links_only() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit_events.jsonl");
    write_schema_invalid_log(&log);

    let out = verify(dir.path(), &[log_arg(&log), "--no-schema"]);

    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_default_schema_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit_events.jsonl");
    write_log(&log, 1);

    let out = verify(dir.path(), &[log_arg(&log)]);

    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("event schema"), "stderr: {stderr}");
}

#[test]
fn explicit_schema_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit_events.jsonl");
    write_log(&log, 2);

    let out = verify(dir.path(), &[log_arg(&log), "--schema", SCHEMA_PATH]);

    assert_eq!(out.status.code(), Some(0));
}
