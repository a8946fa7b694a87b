//! Unit tests for `application::services::chart_service`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use agent_deploy_cli::application::services::chart_service::{
    ChartRequest, StaticFile, generate_chart,
};
use agent_deploy_cli::domain::chart::ChartOptions;
use agent_deploy_cli::domain::error::ChartError;
use agent_deploy_cli::infra::assets::chart_files;

use crate::mocks::{MemStore, RecordingReporter};

const BASE: &[StaticFile<'static>] = &[
    StaticFile {
        path: "values.yaml",
        content: "replicaCount: 3\n",
    },
    StaticFile {
        path: "templates/_helpers.tpl",
        content: "{{- define \"chart.name\" -}}{{- end }}\n",
    },
    StaticFile {
        path: "templates/deployment.yaml",
        content: "kind: Deployment\n",
    },
];

#[test]
fn writes_chart_yaml_and_base_files() {
    let options = ChartOptions::new("agents", "1.2.3", None).unwrap();
    let store = MemStore::default();
    let out = Path::new("/chart");
    let req = ChartRequest {
        options: &options,
        out_dir: out,
        base: BASE,
        templates_dir: None,
    };
    let written = generate_chart(&req, &store, &RecordingReporter::default()).unwrap();
    assert_eq!(written.len(), 4);

    let chart = store.get(out.join("Chart.yaml")).unwrap();
    assert!(chart.contains("name: agents"));
    assert!(chart.contains("version: 1.2.3"));
    assert!(chart.contains("appVersion"));
    assert_eq!(
        store.get(out.join("templates/deployment.yaml")).as_deref(),
        Some("kind: Deployment\n")
    );
}

#[test]
fn custom_templates_replace_builtin_ones() {
    let options = ChartOptions::new("agents", "0.1.0", Some("2.0")).unwrap();
    let store = MemStore::default().with_file(
        "/converted/secret.yaml",
        "apiVersion: v1\nkind: Secret\nmetadata:\n  name: agent-secret\n",
    );
    let out = Path::new("/chart");
    let req = ChartRequest {
        options: &options,
        out_dir: out,
        base: BASE,
        templates_dir: Some(Path::new("/converted")),
    };
    generate_chart(&req, &store, &RecordingReporter::default()).unwrap();

    let names = store.names_under(out);
    assert!(names.contains(&"templates/secret.yaml".to_string()));
    assert!(names.contains(&"templates/_helpers.tpl".to_string()));
    assert!(!names.contains(&"templates/deployment.yaml".to_string()));
}

#[test]
fn empty_templates_dir_is_error() {
    let options = ChartOptions::new("agents", "0.1.0", None).unwrap();
    let store = MemStore::default();
    let req = ChartRequest {
        options: &options,
        out_dir: Path::new("/chart"),
        base: BASE,
        templates_dir: Some(Path::new("/nothing")),
    };
    let err = generate_chart(&req, &store, &RecordingReporter::default()).unwrap_err();
    assert!(err.to_string().contains("no templates found"));
}

#[test]
fn rejects_non_semver_version() {
    let err = ChartOptions::new("agents", "v1", None).unwrap_err();
    assert!(matches!(err, ChartError::InvalidVersion { .. }));
}

#[test]
fn embedded_chart_renders_completely() {
    let options = ChartOptions::new("pulumi-deployment-agent", "0.1.0", None).unwrap();
    let base = chart_files().unwrap();
    let store = MemStore::default();
    let out = Path::new("/chart");
    let req = ChartRequest {
        options: &options,
        out_dir: out,
        base: &base,
        templates_dir: None,
    };
    let written = generate_chart(&req, &store, &RecordingReporter::default()).unwrap();
    assert_eq!(written.len(), base.len() + 1);
    assert!(store.get(out.join(".helmignore")).is_some());
}
