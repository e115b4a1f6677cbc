//! CLI tests for anon-core.
//!
//! These tests verify command output, configuration handling and the
//! exit code contract.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the anon-core binary, isolated from user config.
fn anon_core() -> Command {
    let mut cmd = Command::cargo_bin("anon-core").expect("anon-core binary should exist");
    cmd.env_remove("ANON_RELAY_CONFIG")
        .env_remove("ANON_RELAY_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent-anon-core-xdg")
        .env("ANON_LOG", "error");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
        .join("config")
        .join(name)
}

fn write_config(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("relay.json");
    fs::write(&path, json).expect("write config");
    path
}

// ============================================================================
// Argument handling
// ============================================================================

mod arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        anon_core()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn missing_command_fails() {
        anon_core().assert().failure();
    }

    #[test]
    fn zero_workers_rejected() {
        anon_core()
            .args(["serve", "--workers", "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("workers"));
    }

    #[test]
    fn version_text() {
        anon_core()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("anon-core"))
            .stdout(predicate::str::contains("config schema version: 1.0.0"));
    }

    #[test]
    fn version_json() {
        let output = anon_core()
            .args(["--format", "json", "version"])
            .output()
            .expect("run version");
        assert!(output.status.success());
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("version JSON");
        assert_eq!(parsed["config_schema_version"], "1.0.0");
        assert!(parsed["anon_core_version"].is_string());
    }
}

// ============================================================================
// process
// ============================================================================

mod process {
    use super::*;

    #[test]
    fn echo_cycle_returns_input_verbatim() {
        let input = "My sort code is 12-34-56 and my email is jane@example.com.\n";
        anon_core()
            .arg("process")
            .write_stdin(input)
            .assert()
            .success()
            .stdout(input);
    }

    #[test]
    fn reads_from_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("input.txt");
        fs::write(&path, "server 10.0.0.1 is down").expect("write input");

        anon_core()
            .arg("process")
            .arg(&path)
            .assert()
            .success()
            .stdout("server 10.0.0.1 is down");
    }

    #[test]
    fn json_outcome_reports_counts() {
        let output = anon_core()
            .args(["--format", "json", "process"])
            .write_stdin("sort code 12-34-56, again 12-34-56, then 65-43-21")
            .output()
            .expect("run process");
        assert!(output.status.success());

        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("outcome JSON");
        assert_eq!(
            parsed["text"],
            "sort code 12-34-56, again 12-34-56, then 65-43-21"
        );
        assert_eq!(parsed["entities"]["SORTCODE"], 2);
        assert_eq!(parsed["restored"], 3);
        assert_eq!(parsed["unresolved"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn literal_placeholder_is_unresolved_exit_code() {
        anon_core()
            .arg("process")
            .write_stdin("keep <PERSON_4> as is")
            .assert()
            .code(1)
            .stdout("keep <PERSON_4> as is");
    }

    #[test]
    fn strict_mode_fails_with_lookup_code() {
        anon_core()
            .args(["process", "--strict"])
            .write_stdin("keep <PERSON_4> as is")
            .assert()
            .code(13)
            .stdout("")
            .stderr(predicate::str::contains("PERSON"));
    }

    #[test]
    fn strict_mode_from_config() {
        let dir = TempDir::new().expect("temp dir");
        let config = write_config(&dir, r#"{"restore": {"mode": "strict"}}"#);
        anon_core()
            .arg("--config")
            .arg(&config)
            .arg("process")
            .write_stdin("<SORTCODE_0> was never allocated")
            .assert()
            .code(13);
    }

    #[test]
    fn missing_input_file() {
        anon_core()
            .args(["process", "/nonexistent/input.txt"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("/nonexistent/input.txt"));
    }
}

// ============================================================================
// redact
// ============================================================================

mod redact {
    use super::*;

    #[test]
    fn replaces_values_with_placeholders() {
        anon_core()
            .arg("redact")
            .write_stdin("Sort code 12-34-56, mail jane@example.com")
            .assert()
            .success()
            .stdout("Sort code <SORTCODE_0>, mail <EMAIL_ADDRESS_0>");
    }

    #[test]
    fn show_mapping_json() {
        let output = anon_core()
            .args(["--format", "json", "redact", "--show-mapping"])
            .write_stdin("sort code 12-34-56 and 65-43-21")
            .output()
            .expect("run redact");
        assert!(output.status.success());

        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("redact JSON");
        assert_eq!(parsed["text"], "sort code <SORTCODE_0> and <SORTCODE_1>");
        assert_eq!(parsed["mapping"]["SORTCODE"]["12-34-56"], "<SORTCODE_0>");
        assert_eq!(parsed["mapping"]["SORTCODE"]["65-43-21"], "<SORTCODE_1>");
        assert_eq!(parsed["entities"]["SORTCODE"], 2);
    }

    #[test]
    fn mapping_hidden_by_default() {
        anon_core()
            .args(["--format", "json", "redact"])
            .write_stdin("sort code 12-34-56")
            .assert()
            .success()
            .stdout(predicate::str::contains("mapping").not())
            .stdout(predicate::str::contains("12-34-56").not());
    }

    #[test]
    fn custom_recognizer_from_config() {
        let dir = TempDir::new().expect("temp dir");
        let config = write_config(
            &dir,
            r#"{
                "detection": {
                    "builtin": [],
                    "custom": [{
                        "entity_type": "TICKET",
                        "patterns": [{"name": "ticket", "regex": "\\bTCK-\\d+\\b", "score": 0.9}]
                    }]
                }
            }"#,
        );
        anon_core()
            .arg("--config")
            .arg(&config)
            .arg("redact")
            .write_stdin("see TCK-1001 and TCK-1002, mail jane@example.com")
            .assert()
            .success()
            .stdout("see <TICKET_0> and <TICKET_1>, mail jane@example.com");
    }
}

// ============================================================================
// check
// ============================================================================

mod check {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        anon_core()
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("config: ok"))
            .stdout(predicate::str::contains("builtin default"))
            .stdout(predicate::str::contains(
                "not found: /nonexistent-anon-core-xdg/anon-relay/relay.json",
            ));
    }

    #[test]
    fn valid_fixture() {
        let output = anon_core()
            .args(["--format", "json", "check", "--config"])
            .arg(fixture("valid_relay.json"))
            .output()
            .expect("run check");
        assert!(output.status.success());
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("check JSON");
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["config"]["source"], "CLI argument");
        assert!(parsed["config"]["recognizers"]
            .as_array()
            .expect("recognizers")
            .iter()
            .any(|r| r == "ACCOUNT_NUMBER"));
    }

    #[test]
    fn invalid_fixture_fails_with_config_code() {
        anon_core()
            .arg("check")
            .arg("--config")
            .arg(fixture("invalid_relay_bad_threshold.json"))
            .assert()
            .code(11)
            .stderr(predicate::str::contains("detection.score_threshold"));
    }

    #[test]
    fn bad_regex_fails_with_config_code() {
        anon_core()
            .arg("check")
            .arg("--config")
            .arg(fixture("invalid_relay_bad_regex.json"))
            .assert()
            .code(11)
            .stderr(predicate::str::contains("TICKET"));
    }

    #[test]
    fn missing_config_path() {
        anon_core()
            .args(["check", "--config", "/nonexistent/relay.json"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn json_error_payload() {
        let output = anon_core()
            .args(["--format", "json", "check", "--config", "/nonexistent/relay.json"])
            .output()
            .expect("run check");
        assert_eq!(output.status.code(), Some(11));
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("error JSON");
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["code"], "ERR_CONFIG");
    }

    #[test]
    fn config_from_env_var() {
        anon_core()
            .env("ANON_RELAY_CONFIG", fixture("valid_relay.json"))
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("environment variable"));
    }
}
