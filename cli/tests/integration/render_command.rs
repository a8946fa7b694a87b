//! `kubernetes` and `dind` end to end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::support::{MINIMAL_STACK, agent_deploy, stack_file};

#[test]
fn kubernetes_prints_yaml_stream() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .arg("kubernetes")
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: Deployment"))
        .stdout(predicate::str::contains("replicas: 3"))
        .stdout(predicate::str::contains("kind: ServiceMonitor").not());
}

#[test]
fn config_path_from_environment() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    agent_deploy()
        .env("AGENT_DEPLOY_CONFIG", &path)
        .arg("dind")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker:dind"));
}

#[test]
fn token_only_inside_secret() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    let output = agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["kubernetes", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON list");
    assert_eq!(list["kind"], "List");
    for item in list["items"].as_array().unwrap() {
        let text = item.to_string();
        if item["kind"] == "Secret" {
            assert!(text.contains("tok-integration-789"));
        } else {
            assert!(!text.contains("tok-integration-789"), "{} leaks token", item["kind"]);
        }
    }
    assert!(!String::from_utf8_lossy(&output.stderr).contains("tok-integration-789"));
}

#[test]
fn set_overrides_file_value() {
    let (_dir, path) = stack_file(MINIMAL_STACK);
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["--set", "agentReplicas=5", "kubernetes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("replicas: 5"));
}

#[test]
fn token_from_environment() {
    let (_dir, path) = stack_file("agentNamespace: ci\nagentImage: img:1\n");
    agent_deploy()
        .env("AGENT_DEPLOY_ACCESS_TOKEN", "tok-from-env")
        .arg("--config")
        .arg(&path)
        .arg("dind")
        .assert()
        .success()
        .stdout(predicate::str::contains("tok-from-env"));
}

#[test]
fn missing_key_fails_with_message() {
    let (_dir, path) = stack_file("agentNamespace: ci\nselfHostedAgentsAccessToken: t\n");
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .arg("kubernetes")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("agentImage"));
}

#[test]
fn missing_key_json_error_object() {
    let (_dir, path) = stack_file("agentNamespace: ci\n");
    let output = agent_deploy()
        .arg("--config")
        .arg(&path)
        .args(["dind", "--json"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON error");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "configuration");
}

#[test]
fn unknown_key_lists_valid_keys() {
    let (_dir, path) = stack_file("agentNamspace: typo\n");
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .arg("kubernetes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("agentNamespace"));
}

#[test]
fn out_dir_writes_files_with_digests() {
    let (dir, path) = stack_file(MINIMAL_STACK);
    let out = dir.path().join("rendered");
    agent_deploy()
        .arg("--config")
        .arg(&path)
        .arg("kubernetes")
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    let mut names: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert!(names.contains(&"00-namespace-ci.yaml".to_string()));
    assert!(names.contains(&"00-namespace-ci.yaml.sha256".to_string()));
    assert_eq!(names.iter().filter(|n| n.ends_with(".yaml")).count(), 8);
    let digest = std::fs::read_to_string(out.join("00-namespace-ci.yaml.sha256")).unwrap();
    assert_eq!(digest.trim().len(), 64);
}
