//! CLI integration tests using the REAL voxd-setup binary

mod common;

use common::TestHome;
use predicates::prelude::*;

#[test]
fn test_help_output() {
    let home = TestHome::new();
    home.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Idempotent setup"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("hotkeys"));
}

#[test]
fn test_version_output() {
    let home = TestHome::new();
    home.cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("voxd-setup"))
        .stdout(predicate::str::contains("Build info"));
}

#[test]
fn test_install_help_documents_offline_and_pinning() {
    let home = TestHome::new();
    home.cmd()
        .args(["install", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--offline"))
        .stdout(predicate::str::contains("--skip-models"))
        .stdout(predicate::str::contains("--bin-tag"))
        .stdout(predicate::str::contains("VOXD_BIN_REPO"));
}

#[test]
fn test_hotkeys_guide_prints_instructions() {
    let home = TestHome::new();
    home.cmd()
        .args(["hotkeys", "guide"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GNOME"))
        .stdout(predicate::str::contains("KDE"))
        .stdout(predicate::str::contains("voxd --trigger-record"));
}

#[test]
fn test_completions_bash() {
    let home = TestHome::new();
    home.cmd()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voxd-setup"));
}

#[test]
fn test_completions_unknown_shell_fails() {
    let home = TestHome::new();
    home.cmd()
        .args(["completions", "--shell", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("supported shells"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let home = TestHome::new();
    home.cmd().arg("frobnicate").assert().failure();
}
