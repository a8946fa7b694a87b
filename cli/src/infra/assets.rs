//! Embedded chart skeleton compiled into the CLI binary.
//!
//! At compile time, `include_dir!` embeds everything under `assets/chart/`:
//!   - `values.yaml`, `.helmignore`
//!   - `templates/_helpers.tpl`, `templates/NOTES.txt`
//!   - one template per agent resource

use anyhow::{Context, Result};
use include_dir::{Dir, DirEntry, include_dir};

use crate::application::services::chart_service::StaticFile;

static CHART_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/chart");

/// Every embedded chart file, paths relative to the chart root, sorted.
///
/// # Errors
///
/// Returns an error if an embedded file is not valid UTF-8.
pub fn chart_files() -> Result<Vec<StaticFile<'static>>> {
    let mut files = Vec::new();
    let mut pending: Vec<&'static Dir<'static>> = vec![&CHART_ASSETS];
    while let Some(dir) = pending.pop() {
        for entry in dir.entries() {
            match entry {
                DirEntry::Dir(d) => pending.push(d),
                DirEntry::File(f) => {
                    let path = f
                        .path()
                        .to_str()
                        .with_context(|| format!("non UTF-8 asset path {}", f.path().display()))?;
                    let content = f
                        .contents_utf8()
                        .with_context(|| format!("embedded asset {path} is not UTF-8"))?;
                    files.push(StaticFile { path, content });
                }
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(b.path));
    Ok(files)
}
