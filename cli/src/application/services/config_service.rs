//! Application service: configuration use-cases.

use anyhow::{Context, Result};

use crate::application::ports::ConfigSource;
use crate::domain::config::{ClusterAgentSpec, DindAgentSpec, StackConfig, VmAgentSpec};
use crate::domain::error::ConfigurationError;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the stack file cannot be read or parsed.
pub fn load_config(source: &impl ConfigSource) -> Result<StackConfig> {
    source
        .load()
        .with_context(|| format!("loading {}", source.path().display()))
}

/// Per-target readiness of a configuration.
#[derive(Debug)]
pub struct TargetCheck {
    pub target: &'static str,
    pub result: Result<(), ConfigurationError>,
}

/// Resolve the configuration against every target.
#[must_use]
pub fn check_targets(cfg: &StackConfig) -> Vec<TargetCheck> {
    vec![
        TargetCheck {
            target: "kubernetes",
            result: ClusterAgentSpec::from_config(cfg).map(drop),
        },
        TargetCheck {
            target: "dind",
            result: DindAgentSpec::from_config(cfg).map(drop),
        },
        TargetCheck {
            target: "vm",
            result: VmAgentSpec::from_config(cfg).map(drop),
        },
    ]
}
