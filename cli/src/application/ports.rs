//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared model crate,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use agent_deploy_common::cloud::{MachineImage, NetworkSelector, Subnet, Vpc};
use anyhow::Result;

use crate::domain::config::StackConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Cloud Inventory Port ──────────────────────────────────────────────────────

/// Read-only cloud lookups needed by the VM target.
#[allow(async_fn_in_trait)]
pub trait CloudInventory {
    /// The selected VPC, or `None` when nothing matches.
    async fn find_vpc(&self, selector: &NetworkSelector) -> Result<Option<Vpc>>;
    /// Subnets of `vpc_id` in provider order.
    async fn list_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>>;
    /// Images owned by the caller whose name matches the glob `name_pattern`.
    async fn find_images(&self, name_pattern: &str) -> Result<Vec<MachineImage>>;
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Where the stack configuration comes from.
pub trait ConfigSource {
    /// Path of the stack file in use.
    fn path(&self) -> &Path;
    /// Load, merge overrides, and parse the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    fn load(&self) -> Result<StackConfig>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Reads rendered manifests and writes generated files.
pub trait ManifestStore {
    /// `(file name, content)` of every `.yaml`/`.yml` file directly under
    /// `dir`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be listed or a file cannot be read.
    fn read_yaml_files(&self, dir: &Path) -> Result<Vec<(String, String)>>;
    /// Write `content` to `dir/relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write_file(&self, dir: &Path, relative: &str, content: &str) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
