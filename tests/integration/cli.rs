//! Integration tests for the command-line front end

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn byc(data_dir: &Path, private: bool) -> Command {
    let mut cmd = Command::cargo_bin("byc").expect("binary built");
    cmd.arg("--data-dir")
        .arg(data_dir)
        .arg("--scripted")
        .arg("--user")
        .arg("adama");
    if private {
        cmd.arg("--private");
    }
    cmd
}

/// Test that a game can be started and set up across invocations
#[test]
fn test_start_and_quick_setup() {
    let dir = tempfile::tempdir().unwrap();

    byc(dir.path(), true)
        .arg("byc")
        .assert()
        .success()
        .stdout(predicate::str::contains("Only adama will be able"))
        .stdout(predicate::str::contains("Quick start"));

    byc(dir.path(), true)
        .args(["choose", "start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- game 1 state posted by adama ---"))
        .stdout(predicate::str::contains("Round 1, turn 1"));

    assert!(dir.path().join("game").join("game-1.txt").exists());
    assert!(dir.path().join("topics").join("1-adama.topic").exists());
}

/// Test that commands without a game explain how to start one
#[test]
fn test_no_active_game() {
    let dir = tempfile::tempdir().unwrap();

    byc(dir.path(), true)
        .arg("hand")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no active BYC game"));
}

/// Test that private commands in the public context point to --private
#[test]
fn test_public_context_hint() {
    let dir = tempfile::tempdir().unwrap();
    byc(dir.path(), true).arg("byc").assert().success();
    byc(dir.path(), true)
        .args(["choose", "start"])
        .assert()
        .success();

    byc(dir.path(), false)
        .arg("hand")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--private"));
}

#[test]
fn test_unknown_command() {
    let dir = tempfile::tempdir().unwrap();

    byc(dir.path(), true)
        .arg("fly")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown command: fly"));
}
