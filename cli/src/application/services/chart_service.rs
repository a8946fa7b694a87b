//! Application service: Helm chart generation.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::application::ports::{ManifestStore, ProgressReporter};
use crate::domain::chart::{ChartOptions, RESERVED_TEMPLATES, chart_yaml, process_template};

/// A file shipped with every chart, relative to the chart root.
#[derive(Debug, Clone, Copy)]
pub struct StaticFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

pub struct ChartRequest<'a> {
    pub options: &'a ChartOptions,
    pub out_dir: &'a Path,
    /// Built-in chart files (values, helpers, notes, default templates).
    pub base: &'a [StaticFile<'a>],
    /// Templates converted from rendered manifests. When set they replace
    /// the built-in templates under `templates/`.
    pub templates_dir: Option<&'a Path>,
}

/// Write the chart and return the written paths.
///
/// # Errors
///
/// Returns an error if `templates_dir` holds no templates or a write fails.
pub fn generate_chart(
    req: &ChartRequest<'_>,
    store: &impl ManifestStore,
    reporter: &impl ProgressReporter,
) -> Result<Vec<PathBuf>> {
    let mut written = vec![store.write_file(req.out_dir, "Chart.yaml", &chart_yaml(req.options))?];

    let custom = match req.templates_dir {
        Some(dir) => {
            let files = store.read_yaml_files(dir)?;
            if files.is_empty() {
                bail!("no templates found in {}", dir.display());
            }
            reporter.step(&format!("parameterizing {} templates from {}", files.len(), dir.display()));
            Some(files)
        }
        None => None,
    };

    for file in req.base {
        let is_template = file
            .path
            .strip_prefix("templates/")
            .is_some_and(|name| !RESERVED_TEMPLATES.contains(&name));
        if is_template && custom.is_some() {
            continue;
        }
        written.push(store.write_file(req.out_dir, file.path, file.content)?);
    }

    for (name, content) in custom.iter().flatten() {
        if RESERVED_TEMPLATES.contains(&name.as_str()) {
            continue;
        }
        let path = format!("templates/{name}");
        written.push(store.write_file(req.out_dir, &path, &process_template(name, content))?);
    }

    reporter.success(&format!(
        "chart {} {} generated at {}",
        req.options.name,
        req.options.version,
        req.out_dir.display()
    ));
    Ok(written)
}
