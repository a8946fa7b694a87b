//! Manifest rendering: multi-document YAML and per-resource files.

use agent_deploy_common::Manifest;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One rendered resource ready to be written to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub content: String,
}

impl RenderedFile {
    /// Name of the digest file written next to this one.
    #[must_use]
    pub fn digest_name(&self) -> String {
        format!("{}.sha256", self.name)
    }

    #[must_use]
    pub fn digest(&self) -> String {
        content_digest(&self.content)
    }
}

/// Hex SHA-256 of `content` followed by a newline.
#[must_use]
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}\n", hasher.finalize())
}

/// `NN-kind-name.yaml`, where `NN` is the apply position.
#[must_use]
pub fn manifest_file_name(index: usize, manifest: &Manifest) -> String {
    format!(
        "{index:02}-{}-{}.yaml",
        manifest.kind().to_lowercase(),
        manifest.name()
    )
}

/// Join documents with `---` separators.
///
/// # Errors
///
/// Returns an error if any document fails to serialize.
pub fn to_yaml_stream<T: Serialize>(docs: &[T]) -> Result<String> {
    let parts = docs
        .iter()
        .map(|d| serde_yaml::to_string(d).context("serializing manifest"))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("---\n"))
}

/// Wrap manifests in a `v1/List` for JSON consumers.
#[must_use]
pub fn to_list(manifests: &[Manifest]) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "List",
        "items": manifests,
    })
}

/// One file per manifest, numbered in apply order.
///
/// # Errors
///
/// Returns an error if any manifest fails to serialize.
pub fn render_files(manifests: &[Manifest]) -> Result<Vec<RenderedFile>> {
    manifests
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Ok(RenderedFile {
                name: manifest_file_name(i, m),
                content: serde_yaml::to_string(m)
                    .with_context(|| format!("serializing {} {}", m.kind(), m.name()))?,
            })
        })
        .collect()
}
