//! CLI option interaction tests
//!
//! None of these reach the network: every case either exits during argument
//! or configuration handling, or prints help.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const HTTPING_VARS: [&str; 8] = [
    "HTTPING_DESTINATION",
    "HTTPING_METHOD",
    "HTTPING_COUNT",
    "HTTPING_INTERVAL",
    "HTTPING_TIMEOUT",
    "HTTPING_DISABLE_REDIRECT",
    "HTTPING_INSECURE",
    "ENABLE_COLOR",
];

/// Command running in an empty directory with no HTTPING_* variables set
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("httping").unwrap();
    cmd.current_dir(dir.path());
    for var in HTTPING_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn create_temp_dir_with_env(content: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".env"), content).unwrap();
    temp_dir
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--destination"))
        .stdout(predicate::str::contains("--disable-redirect"))
        .stdout(predicate::str::contains("--zero-fill-stats"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("httping"));
}

#[test]
fn test_missing_destination() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-c", "2", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Destination URL is required"));
}

#[test]
fn test_conflicting_color_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-d", "http://localhost", "--color", "--no-color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot specify both --color and --no-color"));
}

#[test]
fn test_malformed_values_rejected() {
    let dir = TempDir::new().unwrap();
    let cases: [&[&str]; 5] = [
        &["-d", "http://localhost", "-c", "many"],
        &["-d", "http://localhost", "-i", "-1"],
        &["-d", "http://localhost", "--timeout", "0"],
        &["-d", "http://localhost", "--timeout", "301"],
        &["-d", "http://localhost", "--no-such-flag"],
    ];

    for args in cases {
        create_test_cmd(&dir).args(args).assert().failure();
    }
}

#[test]
fn test_invalid_destination() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-d", "ftp://example.com", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[CONFIG]"))
        .stderr(predicate::str::contains("http or https"));

    create_test_cmd(&dir)
        .args(["-d", "not a url", "--no-color"])
        .assert()
        .code(1);
}

#[test]
fn test_zero_count_rejected() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-d", "http://localhost", "-c", "0", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Count must be greater than 0"));
}

#[test]
fn test_huge_count_rejected() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-d", "http://localhost", "-c", "4000000000", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Count cannot exceed 1000000"));
}

#[test]
fn test_env_help() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("HTTPING_DESTINATION"))
        .stdout(predicate::str::contains("Configuration Priority"));
}

#[test]
fn test_invalid_environment_variable() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("HTTPING_COUNT", "lots")
        .args(["-d", "http://localhost", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HTTPING_COUNT"));
}

#[test]
fn test_invalid_env_file_value() {
    let dir = create_temp_dir_with_env("HTTPING_DESTINATION=http://localhost\nHTTPING_TIMEOUT=0\n");
    create_test_cmd(&dir)
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Timeout must be greater than 0"));
}

#[test]
fn test_cli_overrides_invalid_env_file_value() {
    // -c wins over the bad count, then the bad destination still fails validation
    let dir = create_temp_dir_with_env("HTTPING_DESTINATION=gopher://localhost\nHTTPING_COUNT=0\n");
    create_test_cmd(&dir)
        .args(["-c", "1", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("http or https"));
}
