//! Resource composition: pure functions from a resolved spec to a bundle
//! of desired-state objects.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

pub mod cluster;
pub mod dind;
pub mod vm;

use std::collections::BTreeMap;

use agent_deploy_common::Sensitive;
use agent_deploy_common::k8s::{Labels, Manifest, ObjectMeta, Secret};

pub use cluster::{ClusterAgentResources, compose_cluster};
pub use dind::{DindAgentResources, compose_dind};
pub use vm::{VmAgentResources, compose_vm};

/// Secret key (and env var name) holding the agent access token.
pub const TOKEN_KEY: &str = "PULUMI_AGENT_TOKEN";
pub const SECRET_NAME: &str = "agent-secret";
pub const DEPLOYMENT_NAME: &str = "workflow-agent-pool";
pub const WORK_VOLUME: &str = "agent-work";
pub const WORK_DIR: &str = "/mnt/work";
pub const ENV_SHARED_VOLUME: &str = "PULUMI_AGENT_SHARED_VOLUME_DIRECTORY";
pub const AGENT_CONTAINER: &str = "agent";

/// A composed bundle that can be flattened into apply order.
pub trait ResourceSet {
    /// Objects in dependency order: namespace first, workloads after the
    /// config and secrets they reference.
    fn manifests(&self) -> Vec<Manifest>;
}

pub(crate) fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// The one place the access token is written into a resource.
pub(crate) fn token_secret(namespace: &str, token: &Sensitive<String>, labels: &Labels) -> Secret {
    let mut data = BTreeMap::new();
    data.insert(TOKEN_KEY.to_string(), token.clone());
    Secret::opaque(
        ObjectMeta::namespaced(SECRET_NAME, namespace).with_labels(labels),
        data,
    )
}
