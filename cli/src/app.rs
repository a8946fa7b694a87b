//! Application context: unified state passed to every command handler.
//!
//! Constructed once in `Cli::run()` from the global flags, so a new
//! cross-cutting option touches this file and no command signature.

use std::path::PathBuf;

use crate::infra::config::YamlConfigSource;
use crate::infra::fs::LocalFs;
use crate::output::{HumanRenderer, OutputContext, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// YAML documents and human-readable status (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Configuration flags.
pub struct ConfigFlags {
    /// `--config` (or `AGENT_DEPLOY_CONFIG`).
    pub path: Option<PathBuf>,
    /// Repeated `--set key=value` overrides, in command-line order.
    pub overrides: Vec<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub config: ConfigFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Stack configuration source.
    pub config: YamlConfigSource,
    /// Filesystem access for rendered files and charts.
    pub fs: LocalFs,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config: YamlConfigSource::from_env(flags.config.path, flags.config.overrides),
            fs: LocalFs,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
