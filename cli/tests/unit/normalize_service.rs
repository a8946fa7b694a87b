//! Unit tests for `application::services::normalize_service`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use agent_deploy_cli::application::services::normalize_service::normalize_dir;

use crate::mocks::{MemStore, RecordingReporter};

const SECRET: &str = "\
apiVersion: v1
kind: Secret
metadata:
  name: agent-secret
  annotations:
    pulumi.com/patchForce: 'true'
data:
  PULUMI_AGENT_TOKEN: dG9rLTEyMw==
";

const DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: workflow-agent-pool-0a1b2c3d
  annotations:
    pulumi.com/autonamed: 'true'
spec:
  template:
    spec:
      serviceAccountName: workflow-agent-0a1b2c3d
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: workflow-agent-0a1b2c3d
  annotations:
    pulumi.com/autonamed: 'true'
";

#[test]
fn reads_files_in_name_order_and_cleans_them() {
    let dir = Path::new("/rendered");
    let store = MemStore::default()
        .with_file(dir.join("b-deployment.yaml"), DEPLOYMENT)
        .with_file(dir.join("a-secret.yml"), SECRET)
        .with_file(dir.join("README.md"), "not yaml");

    let outcome = normalize_dir(dir, &store, &RecordingReporter::default()).unwrap();
    let names: Vec<&str> = outcome.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["agent-secret", "workflow-agent-pool", "workflow-agent"]);

    assert!(outcome.yaml.contains("serviceAccountName: workflow-agent\n"));
    assert!(outcome.yaml.contains("stringData:"));
    assert!(outcome.yaml.contains("PULUMI_AGENT_TOKEN: tok-123"));
    assert!(!outcome.yaml.contains("pulumi.com/"));
}

#[test]
fn empty_directory_is_an_error() {
    let store = MemStore::default().with_file("/empty/notes.txt", "x");
    let err = normalize_dir(Path::new("/empty"), &store, &RecordingReporter::default()).unwrap_err();
    assert!(err.to_string().contains("no Kubernetes resources found"));
}

#[test]
fn invalid_yaml_names_the_file() {
    let store = MemStore::default().with_file("/bad/broken.yaml", "kind: [unterminated\n");
    let err = normalize_dir(Path::new("/bad"), &store, &RecordingReporter::default()).unwrap_err();
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn reports_count_on_success() {
    let store = MemStore::default().with_file("/r/s.yaml", SECRET);
    let reporter = RecordingReporter::default();
    normalize_dir(Path::new("/r"), &store, &reporter).unwrap();
    assert!(
        reporter
            .events
            .borrow()
            .contains(&"success: normalized 1 resources".to_string())
    );
}
