//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Configuration errors ──────────────────────────────────────────────────────

/// A configuration value is absent or unusable. Raised before any lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing required configuration value '{0}'. Set it in the stack file or with --set {0}=<value>")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Malformed override '{0}': expected key=value")]
    MalformedOverride(String),
}

// ── Resolution errors ─────────────────────────────────────────────────────────

/// A cloud lookup matched nothing. Raised before any resource is emitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No default VPC found in this account/region. Set vpcId explicitly.")]
    NoDefaultNetwork,

    #[error("VPC '{0}' not found.")]
    NetworkNotFound(String),

    #[error("VPC '{0}' has no subnets.")]
    NoSubnets(String),

    #[error("No AMI owned by this account matches '{0}'.")]
    ImageNotFound(String),
}

// ── Chart errors ──────────────────────────────────────────────────────────────

/// Helm chart generation input errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("Invalid chart version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Invalid chart name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),
}
