//! CLI integration tests for claimgraph
//!
//! Tests the claimgraph CLI commands end-to-end using assert_cmd. Every test
//! gets its own config directory and database inside a TempDir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a command isolated inside `temp_dir`
#[allow(deprecated)]
fn claimgraph_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("claimgraph").unwrap();
    cmd.current_dir(temp_dir.path());
    cmd.env("CLAIMGRAPH_CONFIG_DIR", temp_dir.path().join("config"));
    cmd.env("CLAIMGRAPH_DATABASE", temp_dir.path().join("claims.db"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write a small graph: nine routine flu claims and one expensive one at H1
fn write_graph(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("hospitals.jsonl"),
        concat!(
            r#"{"id":"H1","name":"RS Harapan","class_type":"B","specialties":["Surgery"]}"#,
            "\n",
            r#"{"id":"H2","name":"RS Kosong"}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("doctors.jsonl"),
        concat!(
            r#"{"id":"DR1","name":"Dr. Budi","specialization":"GP","primary_hospital_id":"H1"}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("procedures.jsonl"),
        concat!(
            r#"{"code":"87.44","name":"Chest X-ray","avg_cost":60.0}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("diagnoses.jsonl"),
        concat!(
            r#"{"code":"J11","name":"Influenza","reference_cost":100.0,"required_procedures":["87.44"]}"#,
            "\n",
        ),
    )
    .unwrap();

    let mut claims = String::new();
    for i in 1..=9 {
        claims.push_str(&format!(
            r#"{{"id":"C{}","hospital_id":"H1","doctor_id":"DR1","diagnosis_code":"J11","total_cost":100.0}}"#,
            i
        ));
        claims.push('\n');
    }
    claims.push_str(
        r#"{"id":"C10","hospital_id":"H1","doctor_id":"DR1","diagnosis_code":"J11","total_cost":1000.0,"status":"FRAUD"}"#,
    );
    claims.push('\n');
    fs::write(dir.join("claims.jsonl"), claims).unwrap();
}

/// Import the sample graph into the test database
fn seed(temp_dir: &TempDir) {
    let data = temp_dir.path().join("data");
    write_graph(&data);
    claimgraph_cmd(temp_dir)
        .args(["import", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 15 records."));
}

#[test]
fn test_help_and_version() {
    let temp_dir = TempDir::new().unwrap();

    claimgraph_cmd(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("benchmark"))
        .stdout(predicate::str::contains("analyze"));

    claimgraph_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("claimgraph"));
}

#[test]
fn test_import_missing_directory_fails() {
    let temp_dir = TempDir::new().unwrap();

    claimgraph_cmd(&temp_dir)
        .args(["import", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import directory not found"));
}

#[test]
fn test_benchmark_run_flags_outlier() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["benchmark", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Benchmarks: 1 diagnoses updated from 10 claims",
        ))
        .stdout(predicate::str::contains("Scores: 10 claims processed"))
        .stdout(predicate::str::contains("HIGH_OUTLIER:    1"))
        .stdout(predicate::str::contains("NORMAL_VARIANCE: 9"))
        .stdout(predicate::str::contains("C10"));
}

#[test]
fn test_score_before_populate_reports_prerequisite() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["benchmark", "score"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scores: 0 claims processed"));
}

#[test]
fn test_analyze_hospital_text_and_json() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["benchmark", "run", "--no-verify"])
        .assert()
        .success();

    claimgraph_cmd(&temp_dir)
        .args(["analyze", "hospital", "H1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RS Harapan (H1)"))
        .stdout(predicate::str::contains("Influenza"));

    claimgraph_cmd(&temp_dir)
        .args(["analyze", "hospital", "H1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#""analysis_type": "claiming_behavior_normal_distribution""#,
        ))
        .stdout(predicate::str::contains(r#""diagnosis_id": "J11""#))
        .stdout(predicate::str::contains(r#""total_claims": 10"#));
}

#[test]
fn test_analyze_unknown_and_unscored_hospitals_fail() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["benchmark", "run", "--no-verify"])
        .assert()
        .success();

    claimgraph_cmd(&temp_dir)
        .args(["analyze", "hospital", "H404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E001"))
        .stderr(predicate::str::contains("Hospital 'H404' not found"));

    claimgraph_cmd(&temp_dir)
        .args(["analyze", "hospital", "H2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E100"));
}

#[test]
fn test_risk_doctor_profile() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["risk", "doctor", "Dr. Budi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Doctor risk report: Dr. Budi (DR1)"))
        .stdout(predicate::str::contains("Volume: 10 claims"))
        .stdout(predicate::str::contains("Influenza: 100.0% (10 claims)"));
}

#[test]
fn test_risk_claim_reports_upcoding_verdict() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["risk", "claim", "C10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Variance: +900.0%"))
        .stdout(predicate::str::contains("Verdict: HIGH RISK (upcoding)"))
        .stdout(predicate::str::contains("87.44 Chest X-ray"));

    claimgraph_cmd(&temp_dir)
        .args(["risk", "claim", "C1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""verdict": "NORMAL""#));
}

#[test]
fn test_procedures_list() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["procedures", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chest X-ray"))
        .stdout(predicate::str::contains("1 procedures"));
}

#[test]
fn test_claims_list_by_status() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);

    claimgraph_cmd(&temp_dir)
        .args(["claims", "list", "--status", "FRAUD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("C10"))
        .stdout(predicate::str::contains("1 claims"));
}

#[test]
fn test_export_writes_jsonl_files() {
    let temp_dir = TempDir::new().unwrap();
    seed(&temp_dir);
    let out = temp_dir.path().join("export");

    claimgraph_cmd(&temp_dir)
        .args(["export", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 15 records"));

    assert!(out.join("claims.jsonl").exists());
    assert!(out.join("_metadata.json").exists());
}

#[test]
fn test_config_set_get_and_reset() {
    let temp_dir = TempDir::new().unwrap();

    claimgraph_cmd(&temp_dir)
        .args(["config", "set", "report.sample_size", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set report.sample_size = 7"));

    claimgraph_cmd(&temp_dir)
        .args(["config", "get", "report.sample_size"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7"));

    claimgraph_cmd(&temp_dir)
        .args(["config", "set", "report.sample_size", "0"])
        .assert()
        .failure();

    claimgraph_cmd(&temp_dir)
        .args(["config", "reset"])
        .assert()
        .success();

    claimgraph_cmd(&temp_dir)
        .args(["config", "get", "report.sample_size"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));
}

#[test]
fn test_doctor_health_check() {
    let temp_dir = TempDir::new().unwrap();

    claimgraph_cmd(&temp_dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Database: Connected"))
        .stdout(predicate::str::contains("never computed"))
        .stdout(predicate::str::contains("All checks passed!"));
}
