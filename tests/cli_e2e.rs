//! End-to-end CLI tests for the transit-downloader binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use support::{dataset_entry, mount_detail, mount_file, mount_listing, resource, start_mock_server_or_skip};

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("public-transit"))
        .stdout(predicate::str::contains("--extract-zip"))
        .stdout(predicate::str::contains("--max-threads"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("transit-downloader"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_rejects_zero_threads() {
    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.args(["-t", "0"]).assert().failure();
}

#[test]
fn test_binary_unreachable_catalog_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.args(["--catalog-url", "http://127.0.0.1:9", "-o"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to list catalog datasets"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_full_run_against_mock_catalog() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_listing(&server, &[dataset_entry("bus", "Bus", "public-transit")]).await;
    mount_detail(
        &server,
        "bus",
        "Bus",
        &[resource("Stops", "csv", "2024-02-11T00:00:00.0Z", &format!("{uri}/stops.csv"))],
        1,
    )
    .await;
    mount_file(&server, "/stops.csv", b"stop_id\n1\n".to_vec()).await;
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("mirror");

    let mut cmd = Command::cargo_bin("transit-downloader").unwrap();
    cmd.args(["--catalog-url", &uri, "-t", "2", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of datasets returned: 1"))
        .stdout(predicate::str::contains("Total files to download: 1"))
        .stdout(predicate::str::contains("Download complete. Total time:"));

    assert!(output.join("Bus/csv/Stops_2024-02-11/stops.csv").is_file());
    assert!(output.join("errors.log").is_file());
}
