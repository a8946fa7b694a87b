//! Helm chart generation: chart metadata and template rewriting.
//!
//! Static chart files (values, helpers, default templates) are embedded
//! assets; this module owns the parts that depend on user input.

use crate::domain::config::DNS_LABEL_RE;
use crate::domain::error::ChartError;

pub const DEFAULT_CHART_NAME: &str = "pulumi-deployment-agent";
pub const DEFAULT_CHART_VERSION: &str = "0.1.0";

/// Files a caller-supplied template directory must not override.
pub const RESERVED_TEMPLATES: &[&str] = &["_helpers.tpl", "NOTES.txt"];

const SECRET_GUARD: &str = "{{- if and .Values.agent.token (not .Values.agent.existingSecretName) }}";
const RBAC_GUARD: &str = "{{- if .Values.rbac.create }}";
const WORKER_SA_GUARD: &str = "{{- if .Values.workerServiceAccount.create }}";
const SA_GUARD: &str = "{{- if .Values.serviceAccount.create }}";
const MONITOR_GUARD: &str = "{{- if .Values.serviceMonitor.enabled }}";

/// Validated chart identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub name: String,
    pub version: semver::Version,
    pub app_version: String,
}

impl ChartOptions {
    /// Validate the chart name and version. An absent or empty app version
    /// falls back to the chart version.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] for a name that is not a DNS label or a
    /// version that is not semver.
    pub fn new(name: &str, version: &str, app_version: Option<&str>) -> Result<Self, ChartError> {
        if !DNS_LABEL_RE.is_match(name) {
            return Err(ChartError::InvalidName(name.to_string()));
        }
        let parsed = semver::Version::parse(version).map_err(|e| ChartError::InvalidVersion {
            version: version.to_string(),
            reason: e.to_string(),
        })?;
        let app_version = app_version
            .filter(|v| !v.is_empty())
            .map_or_else(|| parsed.to_string(), ToString::to_string);
        Ok(Self {
            name: name.to_string(),
            version: parsed,
            app_version,
        })
    }
}

/// `Chart.yaml` content.
#[must_use]
pub fn chart_yaml(opts: &ChartOptions) -> String {
    format!(
        "apiVersion: v2
name: {name}
description: Helm chart for deploying the Pulumi Customer-Managed Workflow Agent
type: application
version: {version}
appVersion: {app}
maintainers:
  - name: Pulumi
    url: https://github.com/pulumi
home: https://github.com/pulumi/customer-managed-workflow-agent
sources:
  - https://github.com/pulumi/customer-managed-workflow-agent
",
        name = opts.name,
        version = opts.version,
        app = quote_if_needed(&opts.app_version),
    )
}

/// Quote a YAML scalar that would otherwise parse as a number.
fn quote_if_needed(s: &str) -> String {
    if s.parse::<f64>().is_ok() {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

fn wrap_with_guard(content: &str, guard: &str) -> String {
    format!("{guard}\n{content}{{{{- end }}}}\n")
}

/// Leading whitespace plus any YAML sequence marker.
fn indent_of(line: &str) -> &str {
    let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
    let marker = if line[ws..].starts_with("- ") { 2 } else { 0 };
    &line[..ws + marker]
}

/// A line rewrite: lines containing `key` (and not `unless`) that are not
/// already templated become `replacement`.
struct Rule {
    key: &'static str,
    replacement: &'static str,
    unless: Option<&'static str>,
}

const fn rule(key: &'static str, replacement: &'static str) -> Rule {
    Rule {
        key,
        replacement,
        unless: None,
    }
}

fn rewrite_lines(content: &str, rules: &[Rule]) -> String {
    content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.contains("{{") {
                return line.to_string();
            }
            rules
                .iter()
                .find(|r| trimmed.contains(r.key) && r.unless.is_none_or(|u| !trimmed.contains(u)))
                .map_or_else(
                    || line.to_string(),
                    |r| format!("{}{}", indent_of(line), r.replacement),
                )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn deployment_template(content: &str) -> String {
    const RULES: &[Rule] = &[
        rule("replicas:", "replicas: {{ .Values.replicaCount }}"),
        Rule {
            key: "image:",
            replacement: r#"image: {{ include "chart.imageName" . | quote }}"#,
            unless: Some("PULUMI_AGENT_IMAGE"),
        },
        rule("imagePullPolicy:", "imagePullPolicy: {{ .Values.image.pullPolicy }}"),
        rule(
            "serviceAccountName:",
            r#"serviceAccountName: {{ include "chart.serviceAccountName" . }}"#,
        ),
    ];
    rewrite_lines(content, RULES)
}

fn config_map_template(content: &str) -> String {
    const RULES: &[Rule] = &[
        rule(
            "PULUMI_AGENT_SERVICE_URL:",
            "PULUMI_AGENT_SERVICE_URL: {{ .Values.agent.serviceUrl | quote }}",
        ),
        rule(
            "PULUMI_AGENT_IMAGE_PULL_POLICY:",
            "PULUMI_AGENT_IMAGE_PULL_POLICY: {{ .Values.image.pullPolicy | quote }}",
        ),
        rule(
            "PULUMI_AGENT_IMAGE:",
            r#"PULUMI_AGENT_IMAGE: {{ include "chart.imageName" . | quote }}"#,
        ),
        rule(
            "worker-pod.json:",
            "worker-pod.json: {{ .Values.podTemplate.workerPod | quote }}",
        ),
    ];
    rewrite_lines(content, RULES)
}

/// Parameterize a template converted from rendered manifests: replace
/// hard-coded values with chart values and wrap optional resources in
/// their enable guards. The file name decides which rewrite applies.
#[must_use]
pub fn process_template(name: &str, content: &str) -> String {
    let has = |s: &str| name.contains(s);
    match name {
        "service.yaml" => content.to_string(),
        _ if has("deployment") => deployment_template(content),
        _ if has("configmap") => config_map_template(content),
        _ if has("secret") => wrap_with_guard(content, SECRET_GUARD),
        _ if has("role") => wrap_with_guard(content, RBAC_GUARD),
        _ if has("worker") && has("serviceaccount") => wrap_with_guard(content, WORKER_SA_GUARD),
        _ if has("serviceaccount") => wrap_with_guard(content, SA_GUARD),
        _ if has("servicemonitor") => wrap_with_guard(content, MONITOR_GUARD),
        _ => content.to_string(),
    }
}
