//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::config_service::TargetCheck;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("agent-deploy {version}");
    }

    /// Render the merged configuration.
    pub fn render_config(&self, entries: &[(&'static str, String)], path: &Path) {
        println!();
        self.ctx.header(&format!("Configuration ({})", path.display()));
        println!();
        for (key, value) in entries {
            println!("  {:<30} {value}", format!("{key}:").style(self.ctx.styles.dim));
        }
        println!();
    }

    /// Render per-target readiness. Returns `true` when at least one target
    /// is ready.
    pub fn render_checks(&self, checks: &[TargetCheck]) -> bool {
        println!();
        for check in checks {
            match &check.result {
                Ok(()) => println!(
                    "  {} {:<12} ready",
                    "✓".style(self.ctx.styles.success),
                    check.target
                ),
                Err(e) => println!(
                    "  {} {:<12} {e}",
                    "✗".style(self.ctx.styles.error),
                    check.target
                ),
            }
        }
        println!();
        checks.iter().any(|c| c.result.is_ok())
    }

    /// Render a list of written files relative to `dir`.
    pub fn render_written(&self, dir: &Path, files: &[String]) {
        if self.ctx.quiet {
            return;
        }
        for file in files {
            println!("{}", dir.join(file).display());
        }
    }
}

/// JSON shape of a target check.
#[must_use]
pub fn check_to_json(check: &TargetCheck) -> serde_json::Value {
    match &check.result {
        Ok(()) => serde_json::json!({ "target": check.target, "ready": true }),
        Err(e) => serde_json::json!({
            "target": check.target,
            "ready": false,
            "error": e.to_string(),
        }),
    }
}
