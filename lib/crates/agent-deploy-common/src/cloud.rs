// lib/crates/agent-deploy-common/src/cloud.rs

//! EC2 lookup results and the resources the VM composer emits.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensitive::{Sensitive, secret_envelope};

// ── Lookup inputs / results ──────────────────────────────────────────────────

/// How to pick the VPC the agent runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkSelector {
    /// The account's default VPC.
    Default,
    /// An explicit VPC ID.
    ById(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
}

/// An AMI returned by an image search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    pub id: String,
    pub name: String,
    pub creation_date: DateTime<Utc>,
}

// ── Emitted resources ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRule {
    pub from_port: u16,
    pub to_port: u16,
    pub protocol: String,
    pub cidr_blocks: Vec<String>,
}

impl SecurityGroupRule {
    /// Every protocol, every port, every destination.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".into(),
            cidr_blocks: vec!["0.0.0.0/0".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub vpc_id: String,
    pub ingress: Vec<SecurityGroupRule>,
    pub egress: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub ami: String,
    pub instance_type: String,
    pub subnet_id: String,
    /// Output references such as `${agentSg.id}`.
    pub vpc_security_group_ids: Vec<String>,
    #[serde(serialize_with = "secret_envelope")]
    pub user_data: Sensitive<String>,
    pub tags: BTreeMap<String, String>,
}

/// A named resource in the engine's desired-state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudResource<T> {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub properties: T,
}

/// Reference to an output property of another resource in the same document.
#[must_use]
pub fn output_ref(resource: &str, property: &str) -> String {
    format!("${{{resource}.{property}}}")
}
