//! Default values applied when a configuration key is absent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Endpoint the agent registers against when `selfHostedServiceURL` is unset.
pub const DEFAULT_SERVICE_URL: &str = "https://api.pulumi.com";

/// Agent pool size when `agentReplicas` is unset.
pub const DEFAULT_REPLICAS: u32 = 3;

/// AMI name prefix searched when `amiPrefix` is unset.
pub const DEFAULT_AMI_PREFIX: &str = "pulumi-workflow-agent";

/// EC2 instance type when `instanceType` is unset.
pub const DEFAULT_INSTANCE_TYPE: &str = "t3.small";

/// Kubernetes container image pull policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePullPolicy {
    #[default]
    Always,
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    pub const ALL: [ImagePullPolicy; 3] = [Self::Always, Self::IfNotPresent, Self::Never];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

impl fmt::Display for ImagePullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown image pull policy '{0}' (expected Always, IfNotPresent or Never)")]
pub struct ParsePullPolicyError(pub String);

impl FromStr for ImagePullPolicy {
    type Err = ParsePullPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParsePullPolicyError(s.to_string()))
    }
}
