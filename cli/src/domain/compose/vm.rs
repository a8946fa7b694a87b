//! Single EC2 instance running the agent from a pre-baked image.
//!
//! Lookups happen in the application layer; this module only selects among
//! their results and builds the resources.

use std::collections::BTreeMap;

use agent_deploy_common::Sensitive;
use agent_deploy_common::cloud::{
    CloudResource, Instance, MachineImage, SecurityGroup, SecurityGroupRule, Subnet, Vpc,
    output_ref,
};
use serde::Serialize;

use crate::domain::config::VmAgentSpec;
use crate::domain::error::ResolutionError;

pub const SECURITY_GROUP_ID: &str = "agentSg";
pub const INSTANCE_NAME_TAG: &str = "workflow-agent";
pub const AGENT_CONFIG_PATH: &str =
    "/home/ubuntu/.pulumi/bin/customer-managed-workflow-agent/pulumi-workflow-agent.yaml";
pub const AGENT_UNIT: &str = "workflow_agent.service";

#[derive(Debug, Clone)]
pub struct VmAgentResources {
    pub security_group: SecurityGroup,
    pub instance: Instance,
}

/// The engine's desired-state document for the VM target.
#[derive(Debug, Serialize)]
pub struct VmDocument<'a> {
    pub resources: VmDocumentResources<'a>,
}

#[derive(Debug, Serialize)]
pub struct VmDocumentResources<'a> {
    #[serde(rename = "agentSg")]
    pub security_group: CloudResource<&'a SecurityGroup>,
    #[serde(rename = "agent")]
    pub instance: CloudResource<&'a Instance>,
}

impl VmAgentResources {
    #[must_use]
    pub fn document(&self) -> VmDocument<'_> {
        VmDocument {
            resources: VmDocumentResources {
                security_group: CloudResource {
                    type_: "aws:ec2:SecurityGroup",
                    properties: &self.security_group,
                },
                instance: CloudResource {
                    type_: "aws:ec2:Instance",
                    properties: &self.instance,
                },
            },
        }
    }
}

/// Name filter for the image search.
#[must_use]
pub fn image_name_pattern(prefix: &str) -> String {
    format!("{prefix}*")
}

/// First subnet in provider order.
///
/// # Errors
///
/// Returns [`ResolutionError::NoSubnets`] when the list is empty.
pub fn select_subnet<'a>(vpc: &Vpc, subnets: &'a [Subnet]) -> Result<&'a Subnet, ResolutionError> {
    subnets
        .first()
        .ok_or_else(|| ResolutionError::NoSubnets(vpc.id.clone()))
}

/// Most recently created image whose name starts with `prefix`.
///
/// # Errors
///
/// Returns [`ResolutionError::ImageNotFound`] when nothing matches.
pub fn select_image<'a>(
    prefix: &str,
    images: &'a [MachineImage],
) -> Result<&'a MachineImage, ResolutionError> {
    images
        .iter()
        .filter(|img| img.name.starts_with(prefix))
        .max_by_key(|img| img.creation_date)
        .ok_or_else(|| ResolutionError::ImageNotFound(image_name_pattern(prefix)))
}

/// Wrap `s` in single quotes for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Bootstrap script that writes the token into the agent config and starts
/// the service.
#[must_use]
pub fn bootstrap_script(token: &Sensitive<String>) -> Sensitive<String> {
    token.clone().map(|t| {
        format!(
            "#!/bin/bash\nprintf 'token: \"%s\"\\n' {} >> {AGENT_CONFIG_PATH}\nsystemctl start {AGENT_UNIT}\n",
            shell_quote(&t)
        )
    })
}

/// Build the security group and instance from resolved lookups.
///
/// # Errors
///
/// Returns [`ResolutionError`] when no subnet or image qualifies.
pub fn compose_vm(
    spec: &VmAgentSpec,
    vpc: &Vpc,
    subnets: &[Subnet],
    images: &[MachineImage],
) -> Result<VmAgentResources, ResolutionError> {
    let subnet = select_subnet(vpc, subnets)?;
    let image = select_image(&spec.ami_prefix, images)?;

    let security_group = SecurityGroup {
        vpc_id: vpc.id.clone(),
        ingress: Vec::new(),
        egress: vec![SecurityGroupRule::allow_all()],
    };

    let mut tags = BTreeMap::new();
    tags.insert("Name".to_string(), INSTANCE_NAME_TAG.to_string());

    let instance = Instance {
        ami: image.id.clone(),
        instance_type: spec.instance_type.clone(),
        subnet_id: subnet.id.clone(),
        vpc_security_group_ids: vec![output_ref(SECURITY_GROUP_ID, "id")],
        user_data: bootstrap_script(&spec.access_token),
        tags,
    };

    Ok(VmAgentResources {
        security_group,
        instance,
    })
}
