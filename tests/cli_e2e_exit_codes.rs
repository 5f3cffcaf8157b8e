//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: Success
//! - Exit code 1: General error, including a pull in which any subrepo failed
//! - Exit code 2: Invalid command-line usage (handled by clap)

mod common;

use common::prelude::*;

/// Exit code 0 is returned for successful operations.
#[test]
fn test_exit_code_success() {
    let fixture = TestFixture::new().with_manifest("repos: []\n");

    fixture.command().arg("list").assert().code(0);
}

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("monorepo");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("monorepo");

    cmd.arg("--version").assert().code(0);
}

/// Exit code 0 for a pull over an empty manifest; nothing is written.
#[test]
fn test_exit_code_pull_nothing() {
    let fixture = TestFixture::new().with_manifest("");

    fixture.command().arg("pull").assert().code(0);
    fixture.child("monorepo.lock").assert(predicate::path::missing());
}

/// Exit code 1 is returned when the desired-state document is missing.
#[test]
fn test_exit_code_error_manifest_not_found() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("pull")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("monorepo.yml"));
}

/// Exit code 1 is returned for invalid YAML syntax.
#[test]
fn test_exit_code_error_invalid_yaml() {
    let fixture = TestFixture::new().with_manifest("repos: [unclosed");

    fixture
        .command()
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration parsing error"));
}

/// Exit code 1 is returned for duplicate subrepo paths.
#[test]
fn test_exit_code_error_duplicate_path() {
    let fixture = TestFixture::new().with_manifest(
        "repos:\n- path: a\n  url: u1\n  ref: master\n- path: a\n  url: u2\n  ref: master\n",
    );

    fixture
        .command()
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Duplicate subrepo path 'a'"));
}

/// Exit code 1 is returned for a subrepo path outside the monorepo root,
/// before any git command runs.
#[test]
fn test_exit_code_error_path_outside_root() {
    let fixture = TestFixture::new()
        .with_manifest("repos:\n- path: ../b\n  url: u1\n  ref: master\n");

    fixture
        .command()
        .arg("pull")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid subrepo path '../b'"));
    fixture.child(".cache").assert(predicate::path::missing());
}

/// Exit code 2 is returned for invalid command-line arguments.
#[test]
fn test_exit_code_invalid_args() {
    let mut cmd = cargo_bin_cmd!("monorepo");

    cmd.arg("--invalid-flag-that-does-not-exist")
        .assert()
        .code(2);
}

/// Exit code 2 is returned for unknown subcommands.
#[test]
fn test_exit_code_unknown_subcommand() {
    let mut cmd = cargo_bin_cmd!("monorepo");

    cmd.arg("nonexistent-command").assert().code(2);
}
