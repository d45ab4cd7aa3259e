//! End-to-end tests for the feedsync binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn feedsync(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("feedsync").unwrap();
    cmd.arg("--data-dir").arg(data_dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn demo_sync_then_browse_offline() {
    let dir = tempdir().unwrap();

    feedsync(dir.path())
        .args(["sync", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sync: OK"));

    feedsync(dir.path())
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("Headlines"));

    feedsync(dir.path())
        .args(["search", "testing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Testing"));

    feedsync(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Count:   4"));
}

#[test]
fn sync_without_remote_fails() {
    let dir = tempdir().unwrap();

    feedsync(dir.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No remote configured"));
}

#[test]
fn fixture_and_demo_conflict() {
    let dir = tempdir().unwrap();

    feedsync(dir.path())
        .args(["sync", "--demo", "--fixture", "data.json"])
        .assert()
        .failure();
}

#[test]
fn config_file_in_data_dir_is_used() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("feedsync.toml"),
        "[storage]\ndatabase = \"custom.db\"\n",
    )
    .unwrap();

    feedsync(dir.path())
        .args(["sync", "--demo"])
        .assert()
        .success();

    assert!(dir.path().join("custom.db").exists());
    assert!(!dir.path().join("feedsync.db").exists());
}

#[test]
fn unreadable_config_fails() {
    let dir = tempdir().unwrap();

    feedsync(dir.path())
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}
