//! Integration tests for the `runbucket` binary against a local bucket directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_json(id: &str, onset: i64) -> String {
    format!(
        r#"{{
    "wandb_id": "{id}", "lesion_start_epoch": {onset}, "lesion_type": "semantic",
    "model_type": "lstm", "run_name": "s200", "train_data": "tr", "test_data": "te",
    "mask_value": -1.0, "lstm_units": 4, "learning_rate": 0.01, "batch_size": 8,
    "frequency_scale_k": 0.3, "epochs": 3, "seed": 7, "orth_features": 26,
    "phon_features": 25, "phon_max_length": 2
}}"#
    )
}

fn put(root: &Path, name: &str, bytes: &[u8]) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// Creates `<tmp>/store/<objects>` and a `runbucket.toml` pointing at it.
fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    put(&store, "s200/late/config.json", config_json("late", 300).as_bytes());
    put(&store, "s200/early/config.json", config_json("early", 0).as_bytes());
    for epoch in [12, 0, 3] {
        put(&store, &format!("s200/early/states/test/production/epoch_{epoch:04}.pkl"), b"snapshot");
    }
    fs::write(
        temp.path().join("runbucket.toml"),
        format!("bucket_name = \"bkt\"\ndestination_dir = \"mirror\"\n\n[store]\nroot = \"{}\"\n", store.display()),
    )
    .unwrap();
    temp
}

fn runbucket(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("runbucket").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path().join("home"))
        .env_remove("RUNBUCKET_BUCKET")
        .env_remove("RUNBUCKET_STORE_ROOT")
        .env_remove("RUNBUCKET_WORKERS")
        .env_remove("RUNBUCKET_DEST")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_configs_sorted_by_lesion_onset() {
    let temp = setup();
    let output = runbucket(&temp).arg("configs").arg("s200").assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    let early = text.find("early").unwrap();
    let late = text.find("late").unwrap();
    assert!(early < late);
}

#[test]
fn test_configs_json_output() {
    let temp = setup();
    runbucket(&temp)
        .args(["configs", "s200", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wandb_id\": \"early\""));
}

#[test]
fn test_epochs_in_numeric_order() {
    let temp = setup();
    let output = runbucket(&temp).args(["epochs", "s200", "early"]).assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    let positions: Vec<_> = ["epoch_0000", "epoch_0003", "epoch_0012"]
        .iter()
        .map(|name| text.find(name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_fetch_reports_failures_and_exits_non_zero() {
    let temp = setup();
    runbucket(&temp)
        .args(["fetch", "s200/early/config.json", "s200/missing/config.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("s200/missing/config.json"))
        .stdout(predicate::str::contains("Downloaded 1/2"));

    assert!(temp.path().join("mirror/bkt/s200/early/config.json").is_file());
    assert!(!temp.path().join("mirror/bkt/s200/missing/config.json").exists());
}

#[test]
fn test_mirror_whole_bucket() {
    let temp = setup();
    runbucket(&temp)
        .args(["mirror", "--unlimited", "--workers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Downloaded 5/5"));

    assert!(temp.path().join("mirror/bkt/s200/late/config.json").is_file());
    assert!(temp.path().join("mirror/bkt/s200/early/states/test/production/epoch_0012.pkl").is_file());
}

#[test]
fn test_mirror_max_results_caps_listing() {
    let temp = setup();
    runbucket(&temp)
        .args(["mirror", "--max-results", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Downloaded 2/2"));
}

#[test]
fn test_missing_bucket_is_an_error() {
    let temp = TempDir::new().unwrap();
    runbucket(&temp)
        .args(["configs", "s200"])
        .env("RUNBUCKET_STORE_ROOT", temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no bucket configured"));
}

#[test]
fn test_env_overrides_bucket() {
    let temp = setup();
    runbucket(&temp)
        .args(["fetch", "s200/late/config.json"])
        .env("RUNBUCKET_BUCKET", "other")
        .assert()
        .success();
    assert!(temp.path().join("mirror/other/s200/late/config.json").is_file());
}
