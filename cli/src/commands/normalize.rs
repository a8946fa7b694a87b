//! `agent-deploy normalize`: clean engine-rendered manifests.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::normalize_service;
use crate::output::json;

#[derive(Args)]
pub struct NormalizeArgs {
    /// Directory of rendered YAML files
    #[arg(long, value_name = "DIR")]
    pub input_dir: PathBuf,
}

/// Run the normalize command.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, a file does not parse,
/// or no resources are found.
pub fn run(app: &AppContext, args: &NormalizeArgs) -> Result<ExitCode> {
    let outcome = normalize_service::normalize_dir(&args.input_dir, &app.fs, &app.reporter())?;
    if app.is_json() {
        println!("{}", json::to_pretty(&outcome.resources)?);
    } else {
        print!("{}", outcome.yaml);
    }
    Ok(ExitCode::SUCCESS)
}
