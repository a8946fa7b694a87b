// lib/crates/agent-deploy-common/src/k8s.rs

//! Typed subset of the Kubernetes object model emitted by the composers.
//!
//! Field names follow the Kubernetes API (camelCase on the wire). Optional
//! fields are skipped when unset so an `EnvVar` without a value serializes
//! as `{name: X}` rather than `{name: X, value: ""}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sensitive::Sensitive;

pub type Labels = BTreeMap<String, String>;

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata for a namespaced object.
    #[must_use]
    pub fn namespaced(name: &str, namespace: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_labels(mut self, labels: &Labels) -> Self {
        self.labels.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    pub match_labels: Labels,
}

// ── Core objects ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
}

impl Namespace {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            api_version: "v1".into(),
            kind: "Namespace".into(),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    #[must_use]
    pub fn new(metadata: ObjectMeta, data: BTreeMap<String, String>) -> Self {
        Self {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            metadata,
            data,
        }
    }
}

/// Secret with plaintext `stringData`; the API server encodes it on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(rename = "type")]
    pub type_: String,
    pub string_data: BTreeMap<String, Sensitive<String>>,
}

impl Secret {
    #[must_use]
    pub fn opaque(metadata: ObjectMeta, string_data: BTreeMap<String, Sensitive<String>>) -> Self {
        Self {
            api_version: "v1".into(),
            kind: "Secret".into(),
            metadata,
            type_: "Opaque".into(),
            string_data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
}

impl ServiceAccount {
    #[must_use]
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: "v1".into(),
            kind: "ServiceAccount".into(),
            metadata,
        }
    }
}

// ── RBAC ─────────────────────────────────────────────────────────────────────

pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub api_groups: Vec<String>,
    pub resources: Vec<String>,
    pub verbs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub rules: Vec<PolicyRule>,
}

impl Role {
    #[must_use]
    pub fn new(metadata: ObjectMeta, rules: Vec<PolicyRule>) -> Self {
        Self {
            api_version: format!("{RBAC_API_GROUP}/v1"),
            kind: "Role".into(),
            metadata,
            rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    pub kind: String,
    pub name: String,
    pub api_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

impl RoleBinding {
    #[must_use]
    pub fn new(metadata: ObjectMeta, subjects: Vec<Subject>, role_ref: RoleRef) -> Self {
        Self {
            api_version: format!("{RBAC_API_GROUP}/v1"),
            kind: "RoleBinding".into(),
            metadata,
            subjects,
            role_ref,
        }
    }
}

// ── Workloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

impl Deployment {
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: DeploymentSpec) -> Self {
        Self {
            api_version: "apps/v1".into(),
            kind: "Deployment".into(),
            metadata,
            spec,
        }
    }

    /// The pod spec of the deployment's template.
    #[must_use]
    pub fn pod_spec(&self) -> &PodSpec {
        &self.spec.template.spec
    }

    /// Look up a container by name.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.pod_spec().containers.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub replicas: u32,
    pub selector: LabelSelector,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
}

impl Container {
    /// Look up an environment variable by name (first match).
    #[must_use]
    pub fn env_var(&self, name: &str) -> Option<&EnvVar> {
        self.env.iter().find(|e| e.name == name)
    }
}

/// Environment variable. Exactly one of `value` / `value_from` is normally
/// set; both absent means "declared, no value".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    #[must_use]
    pub fn literal(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        }
    }

    /// `Some(v)` becomes a literal, `None` a value-less declaration.
    #[must_use]
    pub fn optional(name: &str, value: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            value,
            value_from: None,
        }
    }

    #[must_use]
    pub fn from_config_map(name: &str, config_map: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                config_map_key_ref: Some(KeySelector::new(config_map, key)),
                ..EnvVarSource::default()
            }),
        }
    }

    #[must_use]
    pub fn from_secret(name: &str, secret: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(KeySelector::new(secret, key)),
                ..EnvVarSource::default()
            }),
        }
    }
}

/// Source of an env value. Unknown source kinds are rejected rather than
/// dropped, since an empty `valueFrom` fails at apply time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvVarSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<ObjectFieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_field_ref: Option<ResourceFieldSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySelector {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Pod field exposed to a container, e.g. `metadata.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectFieldSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub field_path: String,
}

/// Container resource exposed to a container, e.g. `limits.cpu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceFieldSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisor: Option<String>,
}

impl KeySelector {
    #[must_use]
    pub fn new(name: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            optional: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub container_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl VolumeMount {
    #[must_use]
    pub fn new(name: &str, mount_path: &str) -> Self {
        Self {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            sub_path: None,
            read_only: None,
        }
    }

    /// A read-only mount of a single file out of a volume.
    #[must_use]
    pub fn read_only_file(name: &str, mount_path: &str, sub_path: &str) -> Self {
        Self {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            sub_path: Some(sub_path.to_string()),
            read_only: Some(true),
        }
    }
}

/// Pod volume. Exactly one source field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretVolumeSource>,
}

impl Volume {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            empty_dir: None,
            config_map: None,
            secret: None,
        }
    }

    /// Pod-lifetime scratch volume.
    #[must_use]
    pub fn empty_dir(name: &str) -> Self {
        Self {
            empty_dir: Some(EmptyDirVolumeSource {}),
            ..Self::named(name)
        }
    }

    #[must_use]
    pub fn config_map(name: &str, config_map: &str) -> Self {
        Self {
            config_map: Some(ConfigMapVolumeSource {
                name: config_map.to_string(),
            }),
            ..Self::named(name)
        }
    }

    #[must_use]
    pub fn secret(name: &str, secret_name: &str, default_mode: u32) -> Self {
        Self {
            secret: Some(SecretVolumeSource {
                secret_name: secret_name.to_string(),
                default_mode: Some(default_mode),
            }),
            ..Self::named(name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDirVolumeSource {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapVolumeSource {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
}

// ── Networking ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

impl Service {
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: ServiceSpec) -> Self {
        Self {
            api_version: "v1".into(),
            kind: "Service".into(),
            metadata,
            spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub type_: String,
    pub selector: Labels,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub target_port: u16,
    pub protocol: String,
}

// ── Prometheus Operator ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitor {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceMonitorSpec,
}

impl ServiceMonitor {
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: ServiceMonitorSpec) -> Self {
        Self {
            api_version: "monitoring.coreos.com/v1".into(),
            kind: "ServiceMonitor".into(),
            metadata,
            spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    pub selector: LabelSelector,
    pub endpoints: Vec<ScrapeEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeEndpoint {
    pub port: String,
    pub path: String,
    pub interval: String,
}

// ── Heterogeneous list ───────────────────────────────────────────────────────

/// Any object a composer can emit, in apply order when collected into a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Namespace(Namespace),
    ServiceAccount(ServiceAccount),
    Role(Role),
    RoleBinding(RoleBinding),
    ConfigMap(ConfigMap),
    Secret(Secret),
    Deployment(Deployment),
    Service(Service),
    ServiceMonitor(ServiceMonitor),
}

impl Manifest {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Namespace(o) => &o.kind,
            Self::ServiceAccount(o) => &o.kind,
            Self::Role(o) => &o.kind,
            Self::RoleBinding(o) => &o.kind,
            Self::ConfigMap(o) => &o.kind,
            Self::Secret(o) => &o.kind,
            Self::Deployment(o) => &o.kind,
            Self::Service(o) => &o.kind,
            Self::ServiceMonitor(o) => &o.kind,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Namespace(o) => &o.metadata,
            Self::ServiceAccount(o) => &o.metadata,
            Self::Role(o) => &o.metadata,
            Self::RoleBinding(o) => &o.metadata,
            Self::ConfigMap(o) => &o.metadata,
            Self::Secret(o) => &o.metadata,
            Self::Deployment(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::ServiceMonitor(o) => &o.metadata,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Whether this object is a secret store (the only place a token may
    /// appear in plaintext).
    #[must_use]
    pub fn is_secret_store(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}
