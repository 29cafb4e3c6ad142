use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn cli_doubles_values() {
    Command::cargo_bin("taskpool")
        .unwrap()
        .args(&["run", "--workers", "2", "1", "2", "3"])
        .assert()
        .success()
        .stdout(contains("ok 2"))
        .stdout(contains("ok 4"))
        .stdout(contains("ok 6"))
        .stdout(contains("3 succeeded, 0 failed"));
}

#[test]
fn cli_reports_failed_tasks() {
    Command::cargo_bin("taskpool")
        .unwrap()
        .args(&["run", "--workers", "1", "--fail-on", "2", "1", "2", "3"])
        .assert()
        .success()
        .stdout(contains("err refusing to double 2"))
        .stdout(contains("2 succeeded, 1 failed"));
}

#[test]
fn cli_accepts_empty_batch() {
    Command::cargo_bin("taskpool")
        .unwrap()
        .args(&["run", "--quiet"])
        .assert()
        .success()
        .stdout("0 succeeded, 0 failed\n");
}

#[test]
fn cli_rejects_zero_workers() {
    Command::cargo_bin("taskpool")
        .unwrap()
        .args(&["run", "--workers", "0", "1"])
        .assert()
        .failure()
        .stderr(contains("at least one worker"));
}

#[test]
fn cli_version() {
    Command::cargo_bin("taskpool")
        .unwrap()
        .args(&["version"])
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}
