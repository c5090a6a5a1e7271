use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const SNAPSHOT: &str = r#"{
  "teams": [
    {"id": 1, "name": "Red", "score": 170},
    {"id": 2, "name": "Blue", "score": null},
    {"id": 3, "name": "Green", "score": 140}
  ],
  "events": [{"id": 10, "name": "Quiz Bee"}],
  "logs": [
    {"team_name": "Red", "reason": "Quiz Bee", "delta": 15},
    {"team_name": "Red", "reason": "Late Penalty", "delta": -5},
    {"team_name": "Green", "reason": "Quiz Bee", "delta": -10}
  ]
}"#;

fn tally_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tally").expect("tally binary");
    cmd.env_remove("TALLY_CONFIG")
        .env_remove("TALLY_DATABASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    std::fs::write(&base, "scoring:\n  base_points: 100\n").unwrap();

    tally_cmd()
        .args(["config-hash", base.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains(r#"{"scoring":{"base_points":100}}"#));
}

#[test]
fn config_hash_rejects_literal_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    std::fs::write(
        &base,
        "database:\n  url_env: \"postgres://user:pw@localhost/db\"\n",
    )
    .unwrap();

    tally_cmd()
        .args(["config-hash", base.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
}

#[test]
fn config_hash_strict_fails_on_unused_keys() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    std::fs::write(&base, "reveal:\n  confetti_ms: 100\n").unwrap();

    tally_cmd()
        .args(["config-hash", "--strict", base.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn standings_from_snapshot_prints_breakdown_table() {
    let dir = tempfile::tempdir().unwrap();
    let snap = dir.path().join("snap.json");
    std::fs::write(&snap, SNAPSHOT).unwrap();

    tally_cmd()
        .args(["standings", "--snapshot", snap.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("rank\tteam\ttotal\tbase\tQuiz Bee\tresidual"))
        .stdout(predicate::str::contains("1\tRed\t170\t150\t15\t5"))
        .stdout(predicate::str::contains("2\tBlue\t150\t150\t0\t0"))
        .stdout(predicate::str::contains("3\tGreen\t140\t150\t-10\t0"));
}

#[test]
fn standings_honours_configured_base_points() {
    let dir = tempfile::tempdir().unwrap();
    let snap = dir.path().join("snap.json");
    std::fs::write(&snap, SNAPSHOT).unwrap();
    let cfg = dir.path().join("cfg.yaml");
    std::fs::write(&cfg, "scoring:\n  base_points: 100\n").unwrap();

    tally_cmd()
        .args([
            "standings",
            "--config",
            cfg.to_str().unwrap(),
            "--snapshot",
            snap.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3\tBlue\t100\t100\t0\t0"));
}

#[test]
fn db_status_without_url_names_the_missing_variable() {
    tally_cmd()
        .args(["db", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TALLY_DATABASE_URL"));
}
