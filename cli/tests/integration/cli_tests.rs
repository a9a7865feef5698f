//! Integration tests for argument parsing and top-level error handling.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hap() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hap"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("HAP_FILE");
    cmd.env_remove("RUST_LOG");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    hap()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Provision remote hosts over SSH"));
}

#[test]
fn test_cli_help_flag_lists_commands() {
    hap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("exec"))
        .stdout(predicate::str::contains("hosts"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    hap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("hap "));
}

#[test]
fn test_cli_unknown_command_fails() {
    hap().arg("deploy").assert().code(2);
}

#[test]
fn test_exec_requires_a_command() {
    hap()
        .arg("exec")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_host_and_all_conflict() {
    hap()
        .args(["--host", "web1", "--all", "build"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

// --- Hapfile errors ---

#[test]
fn test_missing_hapfile_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    hap()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: cannot read Hapfile"));
}

#[test]
fn test_missing_hapfile_json_error() {
    let dir = TempDir::new().expect("tempdir");
    let output = hap()
        .current_dir(dir.path())
        .args(["--json", "push"])
        .output()
        .expect("run hap");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "HAP_FAILED");
}

#[test]
fn test_malformed_hapfile_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("Hapfile"), "hosts: [").expect("write");
    hap()
        .current_dir(dir.path())
        .arg("hosts")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse Hapfile"));
}

#[test]
fn test_unknown_host_lists_defined_hosts() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("Hapfile"),
        "default:\n  username: deploy\n  password: p\nhosts:\n  web1:\n    addr: 10.0.0.1\n  web2:\n    addr: 10.0.0.2\n",
    )
    .expect("write");
    hap()
        .current_dir(dir.path())
        .args(["--host", "db", "exec", "uptime"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown host: db"))
        .stderr(predicate::str::contains("web1, web2"));
}

#[test]
fn test_ambiguous_selection_asks_for_host() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("Hapfile"),
        "default:\n  username: deploy\n  password: p\nhosts:\n  web1:\n    addr: 10.0.0.1\n  web2:\n    addr: 10.0.0.2\n",
    )
    .expect("write");
    hap()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_unreachable_host_fails_with_connection_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("Hapfile"),
        format!("hosts:\n  local:\n    addr: \"{addr}\"\n    username: deploy\n    password: p\n"),
    )
    .expect("write");
    hap()
        .current_dir(dir.path())
        .args(["exec", "uptime"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(format!("cannot connect to {addr}")))
        .stderr(predicate::str::contains("1 of 1 hosts failed: local"));
}
