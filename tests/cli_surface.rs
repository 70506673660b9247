//! Binary-level checks: exit codes, fatal user-input errors, and the paths
//! that must never touch the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn triage(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("triage").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_session(config_home: &TempDir) {
    let dir = config_home.path().join("triage");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("current.json"),
        r#"{"config": {"token": "t", "universes": ["acme"]}, "endpoint": "http://127.0.0.1:1"}"#,
    )
    .unwrap();
}

#[test]
fn error_command_fails_with_its_message() {
    let home = TempDir::new().unwrap();
    triage(&home)
        .args(["error", "boom"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("boom"));
}

#[test]
fn commands_require_a_session() {
    let home = TempDir::new().unwrap();
    triage(&home)
        .args(["list", "app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Must login first."));
}

#[test]
fn malformed_filter_triple_is_fatal_before_any_request() {
    let home = TempDir::new().unwrap();
    write_session(&home);
    triage(&home)
        .args(["list", "app", "--filter", "hostname,equal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "filter must be of form <column>,<operation>,<value>",
        ));
}

#[test]
fn invalid_age_unit_is_fatal() {
    let home = TempDir::new().unwrap();
    write_session(&home);
    triage(&home)
        .args(["list", "app", "--age", "5q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid age expression"));
}

#[test]
fn query_flag_prints_the_wire_query_without_a_request() {
    let home = TempDir::new().unwrap();
    write_session(&home);
    // Endpoint is unreachable; success proves no request was issued.
    triage(&home)
        .args(["list", "app", "--factor", "fingerprint", "--query"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""group":["fingerprint"]"#))
        .stdout(predicate::str::contains(r#"["greater-than",0]"#));
}

#[test]
fn ls_alias_matches_list() {
    let home = TempDir::new().unwrap();
    write_session(&home);
    triage(&home)
        .args(["ls", "app", "--query"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timestamp"));
}
