//! `config show` / `config validate`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::support::{MINIMAL_STACK, agent_deploy, stack_file};

#[test]
fn show_redacts_token() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("agentNamespace"))
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("tok-integration-789").not());
}

#[test]
fn show_json_is_an_object() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    let output = agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["agentImage"], "img:latest");
    assert_eq!(v["selfHostedAgentsAccessToken"], "***");
}

#[test]
fn validate_reports_each_target() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    let output = agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let checks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ready: Vec<bool> = checks
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["ready"].as_bool().unwrap())
        .collect();
    assert_eq!(ready, [true, true, true]);
}

#[test]
fn validate_fails_when_nothing_is_ready() {
    let (_dir, path) = stack_file("agentNamespace: ci\n");
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("selfHostedAgentsAccessToken"));
}

#[test]
fn explicit_missing_file_is_error() {
    agent_deploy()
        .args(["--config", "/nonexistent/agent-deploy.yaml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
