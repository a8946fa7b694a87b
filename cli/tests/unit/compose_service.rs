//! Unit tests for `application::services::compose_service`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use agent_deploy_cli::application::services::compose_service::{
    KubeTarget, RenderOutcome, compose_target, output_dir, render,
};
use agent_deploy_cli::domain::error::ConfigurationError;
use agent_deploy_cli::domain::render::content_digest;
use agent_deploy_common::Manifest;

use crate::mocks::{InlineConfig, MINIMAL_STACK, MemStore, RecordingReporter};

fn kinds(manifests: &[Manifest]) -> Vec<&str> {
    manifests.iter().map(Manifest::kind).collect()
}

#[test]
fn minimal_cluster_scenario() {
    let (_, manifests) = compose_target(&InlineConfig::new(MINIMAL_STACK), KubeTarget::Cluster).unwrap();
    assert_eq!(
        kinds(&manifests),
        [
            "Namespace",
            "ConfigMap",
            "Secret",
            "ServiceAccount",
            "Role",
            "RoleBinding",
            "Deployment",
            "Service"
        ]
    );
    let Some(Manifest::Deployment(deployment)) =
        manifests.iter().find(|m| m.kind() == "Deployment")
    else {
        panic!("no deployment");
    };
    assert_eq!(deployment.spec.replicas, 3);
}

#[test]
fn service_monitor_and_worker_sa_are_opt_in() {
    let source = InlineConfig::new(MINIMAL_STACK)
        .with_set("enableServiceMonitor=true")
        .with_set("workerServiceAccountName=builds");
    let (_, manifests) = compose_target(&source, KubeTarget::Cluster).unwrap();
    assert_eq!(kinds(&manifests).last(), Some(&"ServiceMonitor"));
    assert_eq!(
        manifests
            .iter()
            .filter(|m| m.kind() == "ServiceAccount")
            .count(),
        2
    );
}

#[test]
fn dind_renders_namespace_secret_deployment() {
    let (_, manifests) = compose_target(&InlineConfig::new(MINIMAL_STACK), KubeTarget::Dind).unwrap();
    assert_eq!(kinds(&manifests), ["Namespace", "Secret", "Deployment"]);
}

#[test]
fn missing_image_fails_before_rendering() {
    let source = InlineConfig::new("agentNamespace: ci\nselfHostedAgentsAccessToken: t\n");
    let err = compose_target(&source, KubeTarget::Cluster).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigurationError>(),
        Some(&ConfigurationError::Missing("agentImage"))
    );
}

#[test]
fn stream_render_separates_documents() {
    let (_, manifests) = compose_target(&InlineConfig::new(MINIMAL_STACK), KubeTarget::Dind).unwrap();
    let store = MemStore::default();
    let outcome = render(&manifests, None, &store, &RecordingReporter::default()).unwrap();
    let RenderOutcome::Stream(yaml) = outcome else {
        panic!("expected stream");
    };
    assert!(yaml.matches("kind: ").count() >= 3);
    assert!(yaml.contains("---\n"));
    assert!(store.files.borrow().is_empty(), "stream render writes nothing");
}

#[test]
fn directory_render_writes_files_and_digests() {
    let (_, manifests) = compose_target(&InlineConfig::new(MINIMAL_STACK), KubeTarget::Dind).unwrap();
    let store = MemStore::default();
    let dir = Path::new("/out");
    let outcome = render(&manifests, Some(dir), &store, &RecordingReporter::default()).unwrap();
    let RenderOutcome::Written { files, .. } = outcome else {
        panic!("expected written files");
    };
    assert_eq!(files.len(), 3);
    assert!(files[0].starts_with("00-namespace-"));
    for name in &files {
        let content = store.get(dir.join(name)).expect("manifest written");
        let digest = store
            .get(dir.join(format!("{name}.sha256")))
            .expect("digest written");
        assert_eq!(digest, content_digest(&content));
    }
}

#[test]
fn out_dir_flag_wins_over_stack_setting() {
    let source = InlineConfig::new(MINIMAL_STACK).with_set("renderYamlToDirectory=from-stack");
    let (cfg, _) = compose_target(&source, KubeTarget::Cluster).unwrap();
    assert_eq!(output_dir(None, &cfg), Some(PathBuf::from("from-stack")));
    assert_eq!(
        output_dir(Some(Path::new("flag")), &cfg),
        Some(PathBuf::from("flag"))
    );
}
