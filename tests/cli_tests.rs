//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd. Every command runs with
//! HOME and the data directory pointed into a temp dir so nothing on the host
//! is read or written.

mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get a command for the persona-forge binary, isolated in `home`
fn forge_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("persona-forge").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("PERSONA_FORGE_DATA_DIR", home.path().join("data"))
        .env("PERSONA_FORGE_INSTITUTIONS_DIR", home.path().join("institutions"))
        .env_remove("PERSONA_FORGE_CONFIG")
        .env_remove("PERSONA_FORGE_OPENAI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn offline_generate(home: &TempDir, count: &str) -> Command {
    let mut cmd = forge_cmd(home);
    cmd.args([
        "generate",
        "--brief",
        "Working supply chain professionals who want a graduate degree",
        "--program",
        "scm",
        "--count",
        count,
        "--offline",
    ]);
    cmd
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Persona Forge"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("templates"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona-forge"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"));
}

#[test]
fn test_missing_subcommand() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home).assert().failure();
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_default() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[generation]"))
        .stdout(predicate::str::contains("[openai]"))
        .stdout(predicate::str::contains("[images]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_show_masks_key() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["config", "show", "--config"])
        .arg(common::valid_config_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-t****"))
        .stdout(predicate::str::contains("sk-test-fixture").not());
}

#[test]
fn test_config_validate() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["config", "validate", "--config"])
        .arg(common::valid_config_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));

    forge_cmd(&home)
        .args(["config", "validate", "--config"])
        .arg(common::invalid_config_fixture())
        .assert()
        .code(10)
        .stderr(predicate::str::contains("between 1 and 10"));
}

#[test]
fn test_config_validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["config", "validate", "--config", "/nonexistent/path/config.toml"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_init() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("forge.toml");

    forge_cmd(&home)
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));
    assert!(fs::read_to_string(&path).unwrap().contains("[generation]"));

    // Second init without --force refuses to overwrite
    forge_cmd(&home)
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ─────────────────────────────────────────────────────────────────
// Catalog Commands
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_templates_list_and_show() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["templates", "list", "--level", "expert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global-leaders-expert"))
        .stdout(predicate::str::contains("career-changers-basic").not());

    forge_cmd(&home)
        .args(["templates", "show", "executives-advanced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("advanced"));

    forge_cmd(&home)
        .args(["templates", "show", "no-such-template"])
        .assert()
        .code(50);
}

#[test]
fn test_institutions_list() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args(["institutions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("msu"))
        .stdout(predicate::str::contains("scm"))
        .stdout(predicate::str::contains("Supply Chain Management"));
}

// ─────────────────────────────────────────────────────────────────
// Validate Command
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_validate_valid_persona() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .arg("validate")
        .arg(common::fixture_path("persona_valid.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (score 100"));
}

#[test]
fn test_validate_invalid_personas() {
    let home = TempDir::new().unwrap();
    let output = forge_cmd(&home)
        .arg("validate")
        .arg(common::fixture_path("persona_invalid.json"))
        .arg("--json")
        .assert()
        .code(40)
        .get_output()
        .stdout
        .clone();

    let results: Value = serde_json::from_slice(&output).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["is_valid"], Value::Bool(true));
    assert_eq!(results[1]["is_valid"], Value::Bool(false));
    assert!(!results[1]["errors"].as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────
// Generate and Sessions
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_generate_offline_persists_and_records() {
    let home = TempDir::new().unwrap();
    let report_path = home.path().join("report.json");

    offline_generate(&home, "3")
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 3 persona(s)"))
        .stdout(predicate::str::contains("3 fallback"));

    let report: Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    let personas = report["personas"].as_array().unwrap();
    assert_eq!(personas.len(), 3);
    assert!(personas.iter().all(|p| p["provenance"] == "fallback"));

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("data").join("personas.json")).unwrap())
            .unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 3);

    forge_cmd(&home)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn test_generate_offline_with_images_uses_placeholders() {
    let home = TempDir::new().unwrap();
    offline_generate(&home, "2")
        .arg("--images")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 generated, 2 placeholder(s)"))
        .stdout(predicate::str::contains("svg?seed="));
}

#[test]
fn test_generate_without_credentials_fails() {
    let home = TempDir::new().unwrap();
    forge_cmd(&home)
        .args([
            "generate",
            "--brief",
            "Working supply chain professionals who want a graduate degree",
            "--program",
            "scm",
        ])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("credentials"));
}

#[test]
fn test_generate_rejects_bad_requests() {
    let home = TempDir::new().unwrap();
    offline_generate(&home, "0").assert().code(40);

    forge_cmd(&home)
        .args([
            "generate",
            "--brief",
            "Working supply chain professionals who want a graduate degree",
            "--program",
            "underwater-basketry",
            "--offline",
        ])
        .assert()
        .code(50);
}

#[test]
fn test_sessions_replay() {
    let home = TempDir::new().unwrap();
    offline_generate(&home, "1").assert().success();

    let sessions_dir = home.path().join("data").join("sessions");
    let session_file = fs::read_dir(&sessions_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let id = session_file.file_stem().unwrap().to_string_lossy().to_string();

    forge_cmd(&home)
        .args(["sessions", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(&id));

    forge_cmd(&home)
        .args(["sessions", "replay", &id, "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 1 persona(s)"));

    forge_cmd(&home)
        .args(["sessions", "show", "missing-session"])
        .assert()
        .code(50);
}
