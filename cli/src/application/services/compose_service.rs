//! Application service: compose and render the Kubernetes targets.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use agent_deploy_common::Manifest;
use anyhow::{Context, Result};

use crate::application::ports::{ConfigSource, ManifestStore, ProgressReporter};
use crate::domain::compose::{ResourceSet, compose_cluster, compose_dind};
use crate::domain::config::{ClusterAgentSpec, DindAgentSpec, StackConfig};
use crate::domain::render::{render_files, to_yaml_stream};

/// Which Kubernetes composer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KubeTarget {
    Cluster,
    Dind,
}

/// Result of a render.
#[derive(Debug)]
pub enum RenderOutcome {
    /// Multi-document YAML for stdout.
    Stream(String),
    /// Files written under `dir`, in apply order (digest files excluded).
    Written { dir: PathBuf, files: Vec<String> },
}

/// Load configuration, resolve the target spec, and compose its resources.
///
/// Nothing is rendered unless composition succeeds.
///
/// # Errors
///
/// Returns an error if the configuration is missing, invalid, or cannot be
/// loaded.
pub fn compose_target(
    source: &impl ConfigSource,
    target: KubeTarget,
) -> Result<(StackConfig, Vec<Manifest>)> {
    let cfg = source
        .load()
        .with_context(|| format!("loading {}", source.path().display()))?;
    let manifests = match target {
        KubeTarget::Cluster => {
            let spec = ClusterAgentSpec::from_config(&cfg)?;
            tracing::debug!(
                namespace = %spec.namespace,
                replicas = spec.replicas,
                service_monitor = spec.enable_service_monitor,
                "composing cluster agent pool"
            );
            compose_cluster(&spec)?.manifests()
        }
        KubeTarget::Dind => {
            let spec = DindAgentSpec::from_config(&cfg)?;
            tracing::debug!(namespace = %spec.namespace, "composing dind agent");
            compose_dind(&spec).manifests()
        }
    };
    Ok((cfg, manifests))
}

/// Render to a directory when one is given, else to a YAML stream.
///
/// Each file gets a `.sha256` digest next to it.
///
/// # Errors
///
/// Returns an error if serialization or a file write fails.
pub fn render(
    manifests: &[Manifest],
    out_dir: Option<&Path>,
    store: &impl ManifestStore,
    reporter: &impl ProgressReporter,
) -> Result<RenderOutcome> {
    let Some(dir) = out_dir else {
        return Ok(RenderOutcome::Stream(to_yaml_stream(manifests)?));
    };
    let rendered = render_files(manifests)?;
    let mut files = Vec::with_capacity(rendered.len());
    for file in &rendered {
        store.write_file(dir, &file.name, &file.content)?;
        store.write_file(dir, &file.digest_name(), &file.digest())?;
        reporter.step(&format!("wrote {}", file.name));
        files.push(file.name.clone());
    }
    reporter.success(&format!("{} manifests written to {}", files.len(), dir.display()));
    Ok(RenderOutcome::Written {
        dir: dir.to_path_buf(),
        files,
    })
}

/// Explicit `--out-dir` wins over the stack file's `renderYamlToDirectory`.
#[must_use]
pub fn output_dir(flag: Option<&Path>, cfg: &StackConfig) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| cfg.render_yaml_to_directory.as_deref().map(PathBuf::from))
}
