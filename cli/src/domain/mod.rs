//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod chart;
pub mod compose;
pub mod config;
pub mod error;
pub mod normalize;
pub mod render;

pub use config::{
    ClusterAgentSpec, DindAgentSpec, StackConfig, VmAgentSpec, parse_stack_config,
    validate_config_key,
};
pub use error::{ChartError, ConfigurationError, ResolutionError};
