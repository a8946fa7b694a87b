//! Stack configuration parsing and resolution into per-target specs.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::sync::LazyLock;

use agent_deploy_common::cloud::NetworkSelector;
use agent_deploy_common::defaults::{
    DEFAULT_AMI_PREFIX, DEFAULT_INSTANCE_TYPE, DEFAULT_REPLICAS, DEFAULT_SERVICE_URL,
};
use agent_deploy_common::k8s::EnvVar;
use agent_deploy_common::{ImagePullPolicy, Sensitive};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};

use crate::domain::error::ConfigurationError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const KEY_NAMESPACE: &str = "agentNamespace";
pub const KEY_IMAGE: &str = "agentImage";
pub const KEY_ACCESS_TOKEN: &str = "selfHostedAgentsAccessToken";
pub const KEY_SERVICE_URL: &str = "selfHostedServiceURL";
pub const KEY_PULL_POLICY: &str = "agentImagePullPolicy";
pub const KEY_REPLICAS: &str = "agentReplicas";
pub const KEY_SERVICE_MONITOR: &str = "enableServiceMonitor";
pub const KEY_CA_SECRET: &str = "caCertificateSecretName";
pub const KEY_NUM_CPUS: &str = "agentNumCpus";
pub const KEY_MEM_QUANTITY: &str = "agentMemQuantity";
pub const KEY_WORKER_SA: &str = "workerServiceAccountName";
pub const KEY_EXTRA_ENV: &str = "agentExtraEnv";
pub const KEY_POD_TEMPLATE: &str = "podTemplate";
pub const KEY_VPC_ID: &str = "vpcId";
pub const KEY_AMI_PREFIX: &str = "amiPrefix";
pub const KEY_INSTANCE_TYPE: &str = "instanceType";
pub const KEY_RENDER_DIR: &str = "renderYamlToDirectory";

pub const VALID_CONFIG_KEYS: &[&str] = &[
    KEY_NAMESPACE,
    KEY_IMAGE,
    KEY_ACCESS_TOKEN,
    "runnerAccessToken",
    KEY_SERVICE_URL,
    KEY_PULL_POLICY,
    KEY_REPLICAS,
    KEY_SERVICE_MONITOR,
    KEY_CA_SECRET,
    KEY_NUM_CPUS,
    KEY_MEM_QUANTITY,
    KEY_WORKER_SA,
    KEY_EXTRA_ENV,
    KEY_POD_TEMPLATE,
    KEY_VPC_ID,
    KEY_AMI_PREFIX,
    KEY_INSTANCE_TYPE,
    KEY_RENDER_DIR,
];

/// Keys whose `--set` values are parsed as YAML rather than kept verbatim.
const TYPED_KEYS: &[&str] = &[
    KEY_REPLICAS,
    KEY_SERVICE_MONITOR,
    KEY_NUM_CPUS,
    KEY_MEM_QUANTITY,
    KEY_EXTRA_ENV,
    KEY_POD_TEMPLATE,
];

/// RFC 1123 label: namespace names.
pub static DNS_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern, cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex")
});

/// RFC 1123 subdomain: secret and service-account names.
pub static DNS_SUBDOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

// ── Raw stack configuration ──────────────────────────────────────────────────

/// Configuration as read from the stack file. Every field is optional here;
/// required-ness and defaults are decided per target by the `*Spec` resolvers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackConfig {
    #[serde(deserialize_with = "scalar_string")]
    pub agent_namespace: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub agent_image: Option<String>,
    #[serde(alias = "runnerAccessToken", deserialize_with = "scalar_secret")]
    pub self_hosted_agents_access_token: Option<Sensitive<String>>,
    #[serde(rename = "selfHostedServiceURL", deserialize_with = "scalar_string")]
    pub self_hosted_service_url: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub agent_image_pull_policy: Option<String>,
    pub agent_replicas: Option<u32>,
    pub enable_service_monitor: Option<bool>,
    #[serde(deserialize_with = "scalar_string")]
    pub ca_certificate_secret_name: Option<String>,
    pub agent_num_cpus: Option<u32>,
    pub agent_mem_quantity: Option<u64>,
    #[serde(deserialize_with = "scalar_string")]
    pub worker_service_account_name: Option<String>,
    pub agent_extra_env: Vec<EnvVar>,
    pub pod_template: Option<serde_json::Value>,
    #[serde(deserialize_with = "scalar_string")]
    pub vpc_id: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub ami_prefix: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub instance_type: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub render_yaml_to_directory: Option<String>,
}

/// String keys accept any YAML scalar, so an unquoted `12345` token reads
/// as the string `"12345"`.
fn scalar_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(serde::de::Error::custom("expected a string or scalar value")),
    }
}

fn scalar_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Sensitive<String>>, D::Error> {
    Ok(scalar_string(d)?.map(Sensitive::new))
}

impl StackConfig {
    /// Key/value pairs for display, with the access token redacted.
    #[must_use]
    pub fn display_entries(&self) -> Vec<(&'static str, String)> {
        fn opt<T: ToString>(v: Option<&T>) -> String {
            v.map_or_else(|| "(not set)".to_string(), ToString::to_string)
        }
        vec![
            (KEY_NAMESPACE, opt(self.agent_namespace.as_ref())),
            (KEY_IMAGE, opt(self.agent_image.as_ref())),
            (KEY_ACCESS_TOKEN, opt(self.self_hosted_agents_access_token.as_ref())),
            (KEY_SERVICE_URL, opt(self.self_hosted_service_url.as_ref())),
            (KEY_PULL_POLICY, opt(self.agent_image_pull_policy.as_ref())),
            (KEY_REPLICAS, opt(self.agent_replicas.as_ref())),
            (KEY_SERVICE_MONITOR, opt(self.enable_service_monitor.as_ref())),
            (KEY_CA_SECRET, opt(self.ca_certificate_secret_name.as_ref())),
            (KEY_NUM_CPUS, opt(self.agent_num_cpus.as_ref())),
            (KEY_MEM_QUANTITY, opt(self.agent_mem_quantity.as_ref())),
            (KEY_WORKER_SA, opt(self.worker_service_account_name.as_ref())),
            (KEY_EXTRA_ENV, format!("{} entries", self.agent_extra_env.len())),
            (
                KEY_POD_TEMPLATE,
                if self.pod_template.is_some() { "set" } else { "(not set)" }.to_string(),
            ),
            (KEY_VPC_ID, opt(self.vpc_id.as_ref())),
            (KEY_AMI_PREFIX, opt(self.ami_prefix.as_ref())),
            (KEY_INSTANCE_TYPE, opt(self.instance_type.as_ref())),
            (KEY_RENDER_DIR, opt(self.render_yaml_to_directory.as_ref())),
        ]
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<(), ConfigurationError> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigurationError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        });
    }
    Ok(())
}

/// Drop a `project:` namespace prefix (`myproj:agentImage` → `agentImage`).
fn bare_key(key: &str) -> &str {
    key.rsplit_once(':').map_or(key, |(_, k)| k)
}

/// Parse stack file content, then apply `key=value` overrides in order.
///
/// The content may be a flat mapping or a stack file with a top-level
/// `config:` section. Keys may carry a `project:` prefix.
///
/// # Errors
///
/// Returns [`ConfigurationError`] for unknown keys, malformed overrides,
/// encrypted values, or values of the wrong type.
pub fn parse_stack_config(
    content: &str,
    overrides: &[String],
) -> Result<StackConfig, ConfigurationError> {
    let root: Value = serde_yaml::from_str(content).map_err(|e| {
        ConfigurationError::InvalidValue {
            key: "stack file".into(),
            reason: e.to_string(),
        }
    })?;

    let section = match root {
        Value::Null => Mapping::new(),
        Value::Mapping(mut m) => match m.remove("config") {
            Some(Value::Mapping(inner)) => inner,
            Some(_) => {
                return Err(ConfigurationError::InvalidValue {
                    key: "config".into(),
                    reason: "expected a mapping".into(),
                });
            }
            None => m,
        },
        _ => {
            return Err(ConfigurationError::InvalidValue {
                key: "stack file".into(),
                reason: "expected a mapping of settings".into(),
            });
        }
    };

    let mut settings = Mapping::new();
    for (key, value) in section {
        let Value::String(key) = key else {
            return Err(ConfigurationError::InvalidValue {
                key: "stack file".into(),
                reason: "setting names must be strings".into(),
            });
        };
        let key = bare_key(&key).to_string();
        validate_config_key(&key)?;
        if let Value::Mapping(m) = &value
            && m.contains_key("secure")
        {
            return Err(ConfigurationError::InvalidValue {
                key,
                reason: "encrypted values are not supported; pass it with --set or AGENT_DEPLOY_ACCESS_TOKEN".into(),
            });
        }
        settings.insert(Value::String(key), value);
    }

    for raw in overrides {
        let (key, value) = parse_override(raw)?;
        settings.insert(Value::String(key), value);
    }

    serde_yaml::from_value(Value::Mapping(settings)).map_err(|e| {
        ConfigurationError::InvalidValue {
            key: "stack file".into(),
            reason: e.to_string(),
        }
    })
}

/// Split a `key=value` override and type its value.
///
/// String-typed keys keep the raw text verbatim (so `0123` stays a string
/// and an empty value stays empty); numeric, boolean and structured keys are
/// parsed as YAML and must not be empty.
///
/// # Errors
///
/// Returns an error for a missing `=`, an unknown key, or an empty value
/// for a typed key.
pub fn parse_override(raw: &str) -> Result<(String, Value), ConfigurationError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConfigurationError::MalformedOverride(raw.to_string()))?;
    let key = bare_key(key.trim());
    validate_config_key(key)?;
    if TYPED_KEYS.contains(&key) && value.trim().is_empty() {
        return Err(invalid(key, "value must not be empty"));
    }
    let typed = if TYPED_KEYS.contains(&key) {
        serde_yaml::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
    } else {
        Value::String(value.to_string())
    };
    Ok((key.to_string(), typed))
}

// ── Resolution helpers ───────────────────────────────────────────────────────

fn invalid(key: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require<'a, T>(value: Option<&'a T>, key: &'static str) -> Result<&'a T, ConfigurationError> {
    value.ok_or(ConfigurationError::Missing(key))
}

fn check_namespace(ns: &str) -> Result<(), ConfigurationError> {
    if DNS_LABEL_RE.is_match(ns) {
        Ok(())
    } else {
        Err(invalid(
            KEY_NAMESPACE,
            format!("'{ns}' must be a lowercase RFC 1123 label"),
        ))
    }
}

fn check_subdomain(key: &str, name: &str) -> Result<(), ConfigurationError> {
    if name.len() <= 253 && DNS_SUBDOMAIN_RE.is_match(name) {
        Ok(())
    } else {
        Err(invalid(key, format!("'{name}' must be a lowercase RFC 1123 subdomain")))
    }
}

fn check_image(image: &str) -> Result<(), ConfigurationError> {
    if image.is_empty() || image.chars().any(char::is_whitespace) {
        return Err(invalid(KEY_IMAGE, "image reference must be non-empty without whitespace"));
    }
    Ok(())
}

fn check_token(token: &Sensitive<String>) -> Result<(), ConfigurationError> {
    if token.expose().trim().is_empty() {
        return Err(invalid(KEY_ACCESS_TOKEN, "access token must not be empty"));
    }
    Ok(())
}

fn pull_policy(cfg: &StackConfig) -> Result<ImagePullPolicy, ConfigurationError> {
    cfg.agent_image_pull_policy
        .as_deref()
        .map_or(Ok(ImagePullPolicy::default()), |p| {
            p.parse().map_err(|e: agent_deploy_common::ParsePullPolicyError| {
                invalid(KEY_PULL_POLICY, e.to_string())
            })
        })
}

fn required_token(cfg: &StackConfig) -> Result<Sensitive<String>, ConfigurationError> {
    let token = require(cfg.self_hosted_agents_access_token.as_ref(), KEY_ACCESS_TOKEN)?;
    check_token(token)?;
    Ok(token.clone())
}

fn required_namespace(cfg: &StackConfig) -> Result<String, ConfigurationError> {
    let ns = require(cfg.agent_namespace.as_ref(), KEY_NAMESPACE)?;
    check_namespace(ns)?;
    Ok(ns.clone())
}

fn required_image(cfg: &StackConfig) -> Result<String, ConfigurationError> {
    let image = require(cfg.agent_image.as_ref(), KEY_IMAGE)?;
    check_image(image)?;
    Ok(image.clone())
}

// ── Cluster agent pool ───────────────────────────────────────────────────────

/// CPU / memory hints passed to the agent. `None` means "auto-detect".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceHints {
    pub num_cpus: Option<u32>,
    pub mem_quantity: Option<u64>,
}

/// Fully resolved input for the cluster agent composer.
#[derive(Debug, Clone)]
pub struct ClusterAgentSpec {
    pub namespace: String,
    pub image: String,
    pub image_pull_policy: ImagePullPolicy,
    pub access_token: Sensitive<String>,
    pub service_url: String,
    pub replicas: u32,
    pub enable_service_monitor: bool,
    pub ca_certificate_secret_name: Option<String>,
    pub resources: ResourceHints,
    pub worker_service_account_name: Option<String>,
    pub extra_env: Vec<EnvVar>,
    pub pod_template: Option<serde_json::Value>,
}

impl ClusterAgentSpec {
    /// Resolve from raw configuration. Defaults apply only to absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when a required key is absent or a
    /// value is out of range.
    pub fn from_config(cfg: &StackConfig) -> Result<Self, ConfigurationError> {
        let namespace = required_namespace(cfg)?;
        let image = required_image(cfg)?;
        let access_token = required_token(cfg)?;

        let service_url = cfg
            .self_hosted_service_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        if !(service_url.starts_with("https://") || service_url.starts_with("http://")) {
            return Err(invalid(
                KEY_SERVICE_URL,
                format!("'{service_url}' must be an http(s) URL"),
            ));
        }

        if let Some(name) = &cfg.ca_certificate_secret_name {
            check_subdomain(KEY_CA_SECRET, name)?;
        }
        if let Some(name) = &cfg.worker_service_account_name {
            check_subdomain(KEY_WORKER_SA, name)?;
        }
        if cfg.agent_num_cpus == Some(0) {
            return Err(invalid(KEY_NUM_CPUS, "must be at least 1 when set"));
        }
        if cfg.agent_mem_quantity == Some(0) {
            return Err(invalid(KEY_MEM_QUANTITY, "must be at least 1 when set"));
        }
        for env in &cfg.agent_extra_env {
            if env.name.is_empty() || env.name.contains('=') {
                return Err(invalid(
                    KEY_EXTRA_ENV,
                    format!("'{}' is not a valid variable name", env.name),
                ));
            }
        }
        if let Some(t) = &cfg.pod_template
            && !t.is_object()
        {
            return Err(invalid(KEY_POD_TEMPLATE, "worker pod template must be an object"));
        }

        Ok(Self {
            namespace,
            image,
            image_pull_policy: pull_policy(cfg)?,
            access_token,
            service_url,
            replicas: cfg.agent_replicas.unwrap_or(DEFAULT_REPLICAS),
            enable_service_monitor: cfg.enable_service_monitor.unwrap_or(false),
            ca_certificate_secret_name: cfg.ca_certificate_secret_name.clone(),
            resources: ResourceHints {
                num_cpus: cfg.agent_num_cpus,
                mem_quantity: cfg.agent_mem_quantity,
            },
            worker_service_account_name: cfg.worker_service_account_name.clone(),
            extra_env: cfg.agent_extra_env.clone(),
            pod_template: cfg.pod_template.clone(),
        })
    }
}

// ── Docker-in-Docker pod ─────────────────────────────────────────────────────

/// Fully resolved input for the DinD composer.
#[derive(Debug, Clone)]
pub struct DindAgentSpec {
    pub namespace: String,
    pub image: String,
    pub image_pull_policy: ImagePullPolicy,
    pub access_token: Sensitive<String>,
}

impl DindAgentSpec {
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when a required key is absent.
    pub fn from_config(cfg: &StackConfig) -> Result<Self, ConfigurationError> {
        Ok(Self {
            namespace: required_namespace(cfg)?,
            image: required_image(cfg)?,
            image_pull_policy: pull_policy(cfg)?,
            access_token: required_token(cfg)?,
        })
    }
}

// ── Virtual machine ──────────────────────────────────────────────────────────

/// Fully resolved input for the VM composer (before cloud lookups).
#[derive(Debug, Clone)]
pub struct VmAgentSpec {
    pub network: NetworkSelector,
    pub ami_prefix: String,
    pub instance_type: String,
    pub access_token: Sensitive<String>,
}

impl VmAgentSpec {
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the token is absent or a set
    /// value is empty.
    pub fn from_config(cfg: &StackConfig) -> Result<Self, ConfigurationError> {
        let access_token = required_token(cfg)?;
        let network = match &cfg.vpc_id {
            None => NetworkSelector::Default,
            Some(id) if id.trim().is_empty() => {
                return Err(invalid(KEY_VPC_ID, "must not be empty when set"));
            }
            Some(id) => NetworkSelector::ById(id.clone()),
        };
        let ami_prefix = cfg
            .ami_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_AMI_PREFIX.to_string());
        if ami_prefix.is_empty() {
            return Err(invalid(KEY_AMI_PREFIX, "must not be empty when set"));
        }
        let instance_type = cfg
            .instance_type
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string());
        if instance_type.is_empty() {
            return Err(invalid(KEY_INSTANCE_TYPE, "must not be empty when set"));
        }
        Ok(Self {
            network,
            ami_prefix,
            instance_type,
            access_token,
        })
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
