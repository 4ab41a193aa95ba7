// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the psychonaut-journal CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Journal CLI with an isolated data dir and config file, colors off
fn journal(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("psychonaut-journal").unwrap();
    cmd.env("PSYJOURNAL_DATA_DIR", dir.path().join("data"))
        .env("PSYJOURNAL_CONFIG", dir.path().join("config.toml"))
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn ingest(dir: &TempDir, args: &[&str]) {
    journal(dir).arg("ingest").args(args).assert().success();
}

// =============================================================================
// Ingest
// =============================================================================

#[test]
fn test_ingest_classifies_dose() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["ingest", "molly", "--dose", "100", "--time", "2025-06-01T20:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged MDMA 100 mg oral"))
        .stdout(predicate::str::contains("common"));

    assert!(dir.path().join("data").join("journal.json").exists());
}

#[test]
fn test_ingest_warns_about_recent_interactions() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z"]);

    journal(&dir)
        .args(["ingest", "Tramadol", "--dose", "50", "--time", "2025-06-01T23:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DANGEROUS"))
        .stdout(predicate::str::contains("Tramadol"));
}

#[test]
fn test_ingest_outside_window_has_no_warning() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z"]);

    journal(&dir)
        .args(["ingest", "Tramadol", "--dose", "50", "--time", "2025-06-10T20:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DANGEROUS").not());
}

#[test]
fn test_backdated_ingest_only_looks_back() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["Tramadol", "--dose", "50", "--time", "2025-06-01T23:00:00Z"]);

    journal(&dir)
        .args(["ingest", "MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DANGEROUS").not());
}

#[test]
fn test_ingest_rejects_invalid_dose() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["ingest", "MDMA", "--dose=-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dose"));
}

#[test]
fn test_ingest_json_output() {
    let dir = TempDir::new().unwrap();

    let out = stdout_of(
        journal(&dir)
            .args(["--json", "ingest", "LSD", "--dose", "100", "--route", "sublingual"])
            .args(["--time", "2025-06-01T18:00:00Z"]),
    );
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["substance"], "LSD");
    assert_eq!(value["dose_class"], "common");
    assert!(value["id"].as_str().unwrap().starts_with("ing:"));
}

// =============================================================================
// Experiences
// =============================================================================

#[test]
fn test_experience_lifecycle() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["experience", "create", "Festival", "--rating", "+++"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created experience: Festival"));

    ingest(&dir, &["MDMA", "--dose", "80", "-e", "fest", "--time", "2025-06-01T20:00:00Z"]);
    ingest(&dir, &["MDMA", "--dose", "40", "-e", "fest", "--time", "2025-06-01T22:00:00Z"]);

    journal(&dir)
        .args(["experience", "show", "Festival"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingestions (2)"))
        .stdout(predicate::str::contains("Cumulative doses"))
        .stdout(predicate::str::contains("120 mg"))
        .stdout(predicate::str::contains("Timeline"));

    let out = stdout_of(journal(&dir).args(["--json", "experience", "list"]));
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(list[0]["title"], "Festival");
    assert_eq!(list[0]["rating"], "+++");

    journal(&dir)
        .args(["experience", "delete", "Festival"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 ingestions"));

    journal(&dir)
        .args(["experience", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No experiences yet"));
}

#[test]
fn test_experience_edit() {
    let dir = TempDir::new().unwrap();
    journal(&dir).args(["experience", "create", "Beach"]).assert().success();

    journal(&dir)
        .args(["experience", "edit", "Beach", "--title", "Beach day", "--favorite", "true"])
        .assert()
        .success();

    let out = stdout_of(journal(&dir).args(["--json", "experience", "list"]));
    let list: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(list[0]["title"], "Beach day");
    assert_eq!(list[0]["is_favorite"], true);
}

#[test]
fn test_unknown_experience_fails() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["experience", "show", "nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("experience not found"));
}

#[test]
fn test_timeline_json() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z"]);

    let list = stdout_of(journal(&dir).args(["--json", "experience", "list"]));
    let list: serde_json::Value = serde_json::from_str(&list).unwrap();
    let id = list[0]["id"].as_str().unwrap().to_string();

    let out = stdout_of(journal(&dir).args(["--json", "timeline", &id]));
    let timeline: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(timeline["ingestions"][0]["shape"], "full");
    assert_eq!(timeline["substances"][0]["substance"], "MDMA");
}

#[test]
fn test_ingestion_delete() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(
        journal(&dir).args(["--json", "ingest", "Caffeine", "--dose", "100", "--time", "2025-06-01T08:00:00Z"]),
    );
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    let id = value["id"].as_str().unwrap().to_string();

    journal(&dir)
        .args(["ingestion", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted ingestion: Caffeine"));

    journal(&dir).args(["ingestion", "delete", &id]).assert().failure();
}

// =============================================================================
// Reference data
// =============================================================================

#[test]
fn test_substance_info() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["substance", "molly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MDMA"))
        .stdout(predicate::str::contains("common"))
        .stdout(predicate::str::contains("Tramadol"));
}

#[test]
fn test_unknown_substance_suggests() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["substance", "Amph"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Amphetamine"));
}

#[test]
fn test_search_by_category() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["search", "stimulant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cocaine"));
}

#[test]
fn test_interactions_command() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["interactions", "MDMA", "Tramadol", "Caffeine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DANGEROUS"))
        .stdout(predicate::str::contains("UNCERTAIN"));

    let out = stdout_of(journal(&dir).args(["--json", "interactions", "Kratom", "MDMA"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["interactions"].as_array().unwrap().len(), 0);
    assert_eq!(value["unknown"][0], "Kratom");
}

// =============================================================================
// Companions, custom substances, stats
// =============================================================================

#[test]
fn test_color_set_and_list() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["MDMA", "--dose", "100"]);

    journal(&dir).args(["color", "set", "molly", "pink"]).assert().success();

    let out = stdout_of(journal(&dir).args(["--json", "color", "list"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["substance"], "MDMA");
    assert_eq!(value[0]["color"], "pink");

    journal(&dir).args(["color", "set", "MDMA", "octarine"]).assert().failure();
}

#[test]
fn test_custom_substance() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["custom", "add", "Kratom", "--units", "g"])
        .assert()
        .success();
    journal(&dir).args(["custom", "add", "MDMA"]).assert().failure();

    journal(&dir)
        .args(["ingest", "kratom", "--dose", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged Kratom 3 g"));
}

#[test]
fn test_stats() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["Caffeine", "--dose", "100"]);
    ingest(&dir, &["Caffeine", "--dose", "50", "--time", "2020-01-01T08:00:00Z"]);

    let out = stdout_of(journal(&dir).args(["--json", "stats"]));
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats[0]["ingestion_count"], 2);

    let out = stdout_of(journal(&dir).args(["--json", "stats", "--days", "30"]));
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats[0]["ingestion_count"], 1);
}

// =============================================================================
// Export / import, config, completions
// =============================================================================

#[test]
fn test_export_import_is_idempotent() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    ingest(&source, &["MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z"]);

    let file = source.path().join("export.json");
    journal(&source)
        .args(["export", "--output"])
        .arg(&file)
        .assert()
        .success();

    journal(&target)
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 experiences, 1 ingestions"));

    journal(&target)
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 experiences, 0 ingestions"));
}

#[test]
fn test_export_csv() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, &["MDMA", "--dose", "100", "--time", "2025-06-01T20:00:00Z", "--note", "with friends, outside"]);

    journal(&dir)
        .args(["export", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("experience,time,substance"))
        .stdout(predicate::str::contains("\"with friends, outside\""));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["config", "timeline_weight", "0.8"])
        .assert()
        .success();
    journal(&dir)
        .args(["config", "timeline_weight"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.8"));

    journal(&dir).args(["config", "timeline_weight", "3"]).assert().failure();
    journal(&dir).args(["config", "nonsense"]).assert().failure();
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();

    journal(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("psychonaut-journal"));
}
