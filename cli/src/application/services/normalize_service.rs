//! Application service: normalize engine-rendered manifests.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::application::ports::{ManifestStore, ProgressReporter};
use crate::domain::normalize::{ResourceId, normalize, resource_id, split_documents};
use crate::domain::render::to_yaml_stream;

#[derive(Debug)]
pub struct NormalizeOutcome {
    pub resources: Vec<ResourceId>,
    pub yaml: String,
}

/// Read every YAML file in `dir`, normalize the combined set, and return
/// it as one multi-document stream.
///
/// # Errors
///
/// Returns an error if a file does not parse or `dir` holds no objects.
pub fn normalize_dir(
    dir: &Path,
    store: &impl ManifestStore,
    reporter: &impl ProgressReporter,
) -> Result<NormalizeOutcome> {
    reporter.step(&format!("reading rendered manifests from {}", dir.display()));
    let mut docs = Vec::new();
    for (name, content) in store.read_yaml_files(dir)? {
        docs.extend(split_documents(&content).with_context(|| format!("parsing {name}"))?);
    }
    if docs.is_empty() {
        bail!("no Kubernetes resources found in {}", dir.display());
    }

    let docs = normalize(docs);
    let resources: Vec<ResourceId> = docs.iter().map(resource_id).collect();
    for r in &resources {
        tracing::debug!(api_version = %r.api_version, kind = %r.kind, name = %r.name, "normalized");
    }
    reporter.success(&format!("normalized {} resources", resources.len()));
    Ok(NormalizeOutcome {
        resources,
        yaml: to_yaml_stream(&docs)?,
    })
}
