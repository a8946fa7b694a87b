//! `chart` end to end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::support::agent_deploy;

#[test]
fn writes_complete_chart() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart");
    agent_deploy()
        .arg("chart")
        .arg("--out-dir")
        .arg(&out)
        .args(["--chart-version", "1.4.0"])
        .assert()
        .success();

    let chart = std::fs::read_to_string(out.join("Chart.yaml")).unwrap();
    assert!(chart.contains("name: pulumi-deployment-agent"));
    assert!(chart.contains("version: 1.4.0"));
    for file in [
        "values.yaml",
        "templates/_helpers.tpl",
        "templates/deployment.yaml",
        "templates/NOTES.txt",
    ] {
        assert!(out.join(file).exists(), "missing {file}");
    }
}

#[test]
fn invalid_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    agent_deploy()
        .arg("chart")
        .arg("--out-dir")
        .arg(dir.path())
        .args(["--chart-version", "latest"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid chart version 'latest'"));
    assert!(!dir.path().join("Chart.yaml").exists());
}

#[test]
fn out_dir_is_required() {
    agent_deploy()
        .arg("chart")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--out-dir"));
}
