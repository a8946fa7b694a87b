//! `agent-deploy config`: inspect the merged configuration.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigSource;
use crate::application::services::config_service;
use crate::output::human::check_to_json;
use crate::output::json;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration (token redacted)
    Show,
    /// Check which targets the configuration is complete for
    Validate,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(app: &AppContext, cmd: &ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Validate => validate_config(app),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config)?;
    let entries = config.display_entries();
    if app.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        println!("{}", json::to_pretty(&map)?);
    } else {
        app.renderer().render_config(&entries, app.config.path());
    }
    Ok(ExitCode::SUCCESS)
}

/// Exit code 1 when no target can be rendered.
fn validate_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config)?;
    let checks = config_service::check_targets(&config);
    let any_ready = if app.is_json() {
        let out: Vec<serde_json::Value> = checks.iter().map(check_to_json).collect();
        println!("{}", json::to_pretty(&out)?);
        checks.iter().any(|c| c.result.is_ok())
    } else {
        app.renderer().render_checks(&checks)
    };
    Ok(if any_ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
