//! End-to-end tests for the step-worker binary.
//!
//! Each test works against its own state file in a temporary directory
//! and exercises the seed, run, and list commands the way an operator
//! would chain them.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn worker() -> Command {
    Command::cargo_bin("step-worker").expect("step-worker binary should be built")
}

fn seed_state(state: &Path) {
    worker()
        .arg("--state")
        .arg(state)
        .arg("seed")
        .assert()
        .success();
}

#[test]
fn test_seed_writes_state_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = dir.path().join("state.json");

    worker()
        .arg("--state")
        .arg(&state)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("seeded"));

    let raw = std::fs::read_to_string(&state).expect("State file should exist");
    let snapshot: serde_json::Value =
        serde_json::from_str(&raw).expect("State file should be valid JSON");
    assert_eq!(
        snapshot["processes"]
            .as_array()
            .expect("processes should be an array")
            .len(),
        2
    );
    assert_eq!(
        snapshot["steps"]
            .as_array()
            .expect("steps should be an array")
            .len(),
        2
    );
}

#[test]
fn test_list_shows_pending_steps() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = dir.path().join("state.json");
    seed_state(&state);

    worker()
        .arg("--state")
        .arg(&state)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("IDENTITY_PROVIDER_DELETION"))
        .stdout(predicate::str::contains("MAILING"))
        .stdout(predicate::str::contains("DELETE_IDP_SHARED_REALM"))
        .stdout(predicate::str::contains("SEND_MAIL"))
        .stdout(predicate::str::contains("TODO"));
}

#[test]
fn test_run_completes_seeded_processes() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = dir.path().join("state.json");
    seed_state(&state);

    // The deletion chain contributes four units of work, the mailing
    // process two; every resolved step is one commit.
    worker()
        .arg("--state")
        .arg(&state)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("pass complete"))
        .stdout(predicate::str::contains("2 processes"))
        .stdout(predicate::str::contains("6 units of work"))
        .stdout(predicate::str::contains("4 commits"));

    worker()
        .arg("--state")
        .arg(&state)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("DELETE_CENTRAL_IDENTITY_PROVIDER"))
        .stdout(predicate::str::contains("DONE"))
        .stdout(predicate::str::contains("TODO").not());
}

#[test]
fn test_second_run_finds_nothing_active() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = dir.path().join("state.json");
    seed_state(&state);

    worker()
        .arg("--state")
        .arg(&state)
        .arg("run")
        .assert()
        .success();

    worker()
        .arg("--state")
        .arg(&state)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 processes"));
}

#[test]
fn test_run_without_state_file_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    worker()
        .arg("--state")
        .arg(dir.path().join("missing.json"))
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_config_restricts_process_types() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = dir.path().join("state.json");
    let config = dir.path().join("worker.toml");
    std::fs::write(&config, "process_types = [\"MAILING\"]\n")
        .expect("Failed to write config file");
    seed_state(&state);

    // Only the mailing process is driven; the deletion process is not
    // picked up at all.
    worker()
        .arg("--state")
        .arg(&state)
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processes"))
        .stdout(predicate::str::contains("1 commits"));

    worker()
        .arg("--state")
        .arg(&state)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("DONE"))
        .stdout(predicate::str::contains("TODO"));
}
