//! `normalize` end to end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::support::agent_deploy;

const RENDERED: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: agent-config-1a2b3c4d
  annotations:
    pulumi.com/autonamed: 'true'
data:
  PULUMI_AGENT_SERVICE_URL: https://api.pulumi.com
";

#[test]
fn strips_hash_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cm.yaml"), RENDERED).unwrap();
    agent_deploy()
        .arg("normalize")
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("name: agent-config\n"))
        .stdout(predicate::str::contains("pulumi.com/autonamed").not());
}

#[test]
fn empty_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    agent_deploy()
        .arg("normalize")
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no Kubernetes resources found"));
}
