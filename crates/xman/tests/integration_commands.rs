//! Commands that need a profile, run through the binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn xman(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("xman").unwrap();
    cmd.current_dir(dir)
        .env_remove("XMAN_CONFIG")
        .env("XMAN_NUGET_URL", "http://127.0.0.1:9");
    cmd
}

/// Tool configuration with one selected profile rooted at `dir/site`.
fn with_profile(dir: &Path) -> std::path::PathBuf {
    let project = dir.join("site");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        dir.join("xman.json"),
        serde_json::to_string_pretty(&json!({
            "Version": "4.0.0",
            "CurrentProfile": "site",
            "Profiles": [
                { "ProjectName": "site", "WorkingDirectory": project.display().to_string() }
            ]
        }))
        .unwrap(),
    )
    .unwrap();
    project
}

#[test]
fn test_build_requires_profile() {
    let dir = TempDir::new().unwrap();
    xman(dir.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("This command requires a profile."));
}

#[test]
fn test_settings_without_appsettings_reports_error() {
    let dir = TempDir::new().unwrap();
    with_profile(dir.path());

    // No settings file and no terminal: the command fails before building anything
    xman(dir.path())
        .arg("s")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Current profile:"))
        .stderr(predicate::str::contains("Process failed with error"));
}

#[test]
fn test_cd_rejects_unknown_action() {
    let dir = TempDir::new().unwrap();
    with_profile(dir.path());

    xman(dir.path())
        .args(["cd", "sync"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Current profile:").not())
        .stderr(predicate::str::contains(
            "Must provide one parameter from 'store, restore, config'",
        ));
}

#[cfg(unix)]
#[test]
fn test_build_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    with_profile(dir.path());

    // Either dotnet is missing or the empty folder has nothing to build
    xman(dir.path())
        .env("XMAN_SHELL", "sh")
        .arg("b")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Current profile:"))
        .stdout(predicate::str::contains("Attempting to build the project..."))
        .stderr(predicate::str::contains("Process failed with errors"));
}
