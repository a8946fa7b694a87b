//! `CloudInventory` backed by the `aws` CLI.
//!
//! Each lookup is one `aws ec2 describe-*` call with `--output json`; the
//! region and credentials come from the caller's AWS environment.

use agent_deploy_common::cloud::{MachineImage, NetworkSelector, Subnet, Vpc};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::ports::{CloudInventory, CommandRunner};

const AWS: &str = "aws";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVpcs {
    #[serde(default)]
    vpcs: Vec<VpcRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcRecord {
    vpc_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSubnets {
    #[serde(default)]
    subnets: Vec<SubnetRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetRecord {
    subnet_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeImages {
    #[serde(default)]
    images: Vec<ImageRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageRecord {
    image_id: String,
    #[serde(default)]
    name: String,
    creation_date: DateTime<Utc>,
}

pub struct AwsCliInventory<R> {
    runner: R,
}

impl<R: CommandRunner> AwsCliInventory<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run `aws ec2 <args> --output json`. `Ok(None)` when the CLI reports
    /// that the requested object does not exist.
    async fn ec2(&self, args: &[&str]) -> Result<Option<Vec<u8>>> {
        let mut full = vec!["ec2"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--output", "json"]);
        let output = self.runner.run(AWS, &full).await?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(".NotFound") {
            return Ok(None);
        }
        bail!("aws ec2 {} failed: {}", args[0], stderr.trim());
    }
}

fn parse<T: for<'de> Deserialize<'de>>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes).with_context(|| format!("parsing aws ec2 {what} output"))
}

impl<R: CommandRunner> CloudInventory for AwsCliInventory<R> {
    async fn find_vpc(&self, selector: &NetworkSelector) -> Result<Option<Vpc>> {
        let args: Vec<&str> = match selector {
            NetworkSelector::Default => {
                vec!["describe-vpcs", "--filters", "Name=isDefault,Values=true"]
            }
            NetworkSelector::ById(id) => vec!["describe-vpcs", "--vpc-ids", id.as_str()],
        };
        let Some(out) = self.ec2(&args).await? else {
            return Ok(None);
        };
        let parsed: DescribeVpcs = parse(&out, "describe-vpcs")?;
        Ok(parsed.vpcs.into_iter().next().map(|v| Vpc { id: v.vpc_id }))
    }

    async fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>> {
        let filter = format!("Name=vpc-id,Values={vpc_id}");
        let Some(out) = self.ec2(&["describe-subnets", "--filters", &filter]).await? else {
            return Ok(Vec::new());
        };
        let parsed: DescribeSubnets = parse(&out, "describe-subnets")?;
        Ok(parsed
            .subnets
            .into_iter()
            .map(|s| Subnet { id: s.subnet_id })
            .collect())
    }

    async fn find_images(&self, name_pattern: &str) -> Result<Vec<MachineImage>> {
        let filter = format!("Name=name,Values={name_pattern}");
        let Some(out) = self
            .ec2(&["describe-images", "--owners", "self", "--filters", &filter])
            .await?
        else {
            return Ok(Vec::new());
        };
        let parsed: DescribeImages = parse(&out, "describe-images")?;
        Ok(parsed
            .images
            .into_iter()
            .map(|i| MachineImage {
                id: i.image_id,
                name: i.name,
                creation_date: i.creation_date,
            })
            .collect())
    }
}
