//! Command-line behaviour of the `syncwatch` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const BATCH: &str = r#"[
    {"id": 10, "type": "DeviceConnected", "data": {"id": "ABCDEFGHIJ", "deviceName": "laptop", "addr": "10.0.0.2:22000", "type": "tcp-client"}},
    {"id": 11, "type": "FolderCompletion", "data": {"device": "ABCDEFGHIJ", "folder": "docs", "completion": 42}},
    {"id": 12, "type": "StateChanged", "data": {"folder": "docs", "from": "idle", "to": "syncing"}}
]"#;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn syncwatch(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("syncwatch").unwrap();
    // Keep the user's real config file out of the picture.
    cmd.env("XDG_CONFIG_HOME", config_dir)
        .env("HOME", config_dir)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn replay_prints_report() {
    let dir = tempdir().unwrap();
    let batch = write(dir.path(), "batch.json", BATCH);

    syncwatch(dir.path())
        .arg("replay")
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Model: valid (last event: 12)"))
        .stdout(predicate::str::contains("laptop [ABCDEFG]"))
        .stdout(predicate::str::contains("docs: syncing"));
}

#[test]
fn replay_json_output() {
    let dir = tempdir().unwrap();
    let batch = write(dir.path(), "batch.json", BATCH);

    let output = syncwatch(dir.path())
        .args(["replay", "--json"])
        .arg(&batch)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["last_applied_id"], 12);
    assert_eq!(json["completion"]["ABCDEFGHIJ"]["docs"], 42.0);
    assert_eq!(json["folder_states"]["docs"], "syncing");
}

#[test]
fn replayed_stale_batch_reports_invalid_but_succeeds() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "1.json", BATCH);
    let again = write(dir.path(), "2.json", BATCH);

    syncwatch(dir.path())
        .arg("replay")
        .arg(&first)
        .arg(&again)
        .assert()
        .success()
        .stdout(predicate::str::contains("INVALID (needs resync)"))
        .stderr(predicate::str::contains("Model invalidated during replay"));
}

#[test]
fn contiguous_flag_catches_gaps() {
    let dir = tempdir().unwrap();
    let gap = write(
        dir.path(),
        "gap.json",
        r#"[{"id": 1, "type": "Ping"}, {"id": 5, "type": "Ping"}]"#,
    );

    syncwatch(dir.path())
        .arg("replay")
        .arg(&gap)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Model: valid"));

    syncwatch(dir.path())
        .args(["replay", "--contiguous"])
        .arg(&gap)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Model: INVALID"));
}

#[test]
fn config_file_selects_ordering() {
    let dir = tempdir().unwrap();
    let config = write(
        dir.path(),
        "syncwatch.toml",
        "[model]\nordering = \"contiguous\"\n",
    );

    syncwatch(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ordering = \"contiguous\""));
}

#[test]
fn default_config_shows_monotonic() {
    let dir = tempdir().unwrap();

    syncwatch(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ordering = \"monotonic\""))
        .stdout(predicate::str::contains("log_status = false"));
}

#[test]
fn missing_batch_file_fails() {
    let dir = tempdir().unwrap();

    syncwatch(dir.path())
        .args(["replay", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn replay_requires_a_file() {
    let dir = tempdir().unwrap();

    syncwatch(dir.path()).arg("replay").assert().failure();
}
