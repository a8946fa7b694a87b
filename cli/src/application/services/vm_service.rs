//! Application service: resolve cloud lookups and compose the VM target.
//!
//! Lookups run in order (network, subnets, image) since each depends on
//! the previous one. Any empty result aborts before a resource is built.

use agent_deploy_common::cloud::NetworkSelector;
use anyhow::{Context, Result};

use crate::application::ports::{CloudInventory, ConfigSource, ProgressReporter};
use crate::domain::compose::vm::{VmAgentResources, compose_vm, image_name_pattern};
use crate::domain::config::VmAgentSpec;
use crate::domain::error::ResolutionError;

/// Load configuration and resolve the VM spec.
///
/// # Errors
///
/// Returns an error if the configuration is missing, invalid, or cannot be
/// loaded.
pub fn load_spec(source: &impl ConfigSource) -> Result<VmAgentSpec> {
    let cfg = source
        .load()
        .with_context(|| format!("loading {}", source.path().display()))?;
    Ok(VmAgentSpec::from_config(&cfg)?)
}

/// Run the lookups and build the instance and security group.
///
/// # Errors
///
/// Returns [`ResolutionError`] (via `anyhow`) when a lookup matches nothing,
/// or the inventory's own error when a lookup fails.
pub async fn resolve_and_compose(
    spec: &VmAgentSpec,
    inventory: &impl CloudInventory,
    reporter: &impl ProgressReporter,
) -> Result<VmAgentResources> {
    reporter.step("resolving network...");
    let vpc = inventory
        .find_vpc(&spec.network)
        .await?
        .ok_or_else(|| match &spec.network {
            NetworkSelector::Default => ResolutionError::NoDefaultNetwork,
            NetworkSelector::ById(id) => ResolutionError::NetworkNotFound(id.clone()),
        })?;
    tracing::debug!(vpc = %vpc.id, "network resolved");

    reporter.step("listing subnets...");
    let subnets = inventory.list_subnets(&vpc.id).await?;
    tracing::debug!(count = subnets.len(), "subnets listed");

    reporter.step("finding machine image...");
    let images = inventory
        .find_images(&image_name_pattern(&spec.ami_prefix))
        .await?;

    let resources = compose_vm(spec, &vpc, &subnets, &images)?;
    reporter.success(&format!(
        "instance {} in {} ({})",
        resources.instance.instance_type, resources.instance.subnet_id, resources.instance.ami
    ));
    Ok(resources)
}
