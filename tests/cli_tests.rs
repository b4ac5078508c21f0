//! CLI integration tests
//!
//! Audio hardware is never assumed: every non-ignored test drives a
//! path that fails or completes before any device is opened.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with config and storage isolated under a temp home
fn voicenote(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("voicenote").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--storage-dir"))
        .stdout(predicate::str::contains("--permission"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("voicenote"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_help() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voicenote"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();

    voicenote(&home)
        .args(["config", "set", "permission", "granted"])
        .assert()
        .success();

    voicenote(&home)
        .args(["config", "get", "permission"])
        .assert()
        .success()
        .stdout(predicate::str::contains("granted"));
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_permission() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "permission", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid options"));
}

#[test]
fn config_list_shows_both_keys() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("storage_dir"))
        .stdout(predicate::str::contains("permission"));
}

#[test]
fn play_without_recording_fails() {
    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    voicenote(&home)
        .args(["play", "--storage-dir"])
        .arg(storage.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recording"));
}

#[test]
fn record_with_denied_permission_fails() {
    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    voicenote(&home)
        .args(["record", "--permission", "denied", "--storage-dir"])
        .arg(storage.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("denied"));
}

#[test]
fn status_reports_empty_slot() {
    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    voicenote(&home)
        .args(["status", "--permission", "denied", "--storage-dir"])
        .arg(storage.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn status_shows_permission_state() {
    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    voicenote(&home)
        .args(["status", "--permission", "granted", "--storage-dir"])
        .arg(storage.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("permission"))
        .stdout(predicate::str::contains("granted"));
}

#[test]
#[ignore = "Requires audio hardware"]
fn record_then_play_round_trip() {
    let home = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    // Enter on stdin stops the recording after about a second
    voicenote(&home)
        .args(["record", "--storage-dir"])
        .arg(storage.path())
        .write_stdin("\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved"));

    let slot = storage.path().join("recording.flac");
    assert!(slot.metadata().unwrap().len() > 0);

    voicenote(&home)
        .args(["play", "--storage-dir"])
        .arg(storage.path())
        .assert()
        .success();
}
