//! Argument parsing, help, and version.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::support::agent_deploy;

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    agent_deploy().assert().code(2).stderr(predicate::str::contains(
        "Generate deployment manifests for self-hosted deployment agents",
    ));
}

#[test]
fn test_cli_help_lists_targets() {
    agent_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("kubernetes"))
        .stdout(predicate::str::contains("dind"))
        .stdout(predicate::str::contains("vm"));
}

#[test]
fn test_version_command_shows_version() {
    agent_deploy()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("agent-deploy 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = agent_deploy()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(v["version"], "0.1.0");
}

#[test]
fn test_unknown_command_fails() {
    agent_deploy()
        .arg("deploy-everything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
