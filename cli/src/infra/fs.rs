//! Filesystem infrastructure: implements `ManifestStore`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ManifestStore;

/// Production filesystem implementation of `ManifestStore`.
pub struct LocalFs;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

impl ManifestStore for LocalFs {
    fn read_yaml_files(&self, dir: &Path) -> Result<Vec<(String, String)>> {
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("listing {}", dir.display()))?
                .path();
            if !path.is_file() || !is_yaml(&path) {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push((name, content));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn write_file(&self, dir: &Path, relative: &str, content: &str) -> Result<PathBuf> {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
