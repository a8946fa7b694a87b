//! `agent-deploy chart`: generate the Helm chart for the cluster agent pool.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::chart_service::{self, ChartRequest};
use crate::domain::chart::{ChartOptions, DEFAULT_CHART_NAME, DEFAULT_CHART_VERSION};
use crate::infra::assets::chart_files;
use crate::output::json;

#[derive(Args)]
pub struct ChartArgs {
    /// Directory to write the chart into
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Chart name
    #[arg(long, default_value = DEFAULT_CHART_NAME)]
    pub chart_name: String,

    /// Chart version (semver)
    #[arg(long, default_value = DEFAULT_CHART_VERSION)]
    pub chart_version: String,

    /// Application version [default: the chart version]
    #[arg(long)]
    pub app_version: Option<String>,

    /// Rendered manifests to parameterize instead of the built-in templates
    #[arg(long, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,
}

/// Run the chart command.
///
/// # Errors
///
/// Returns an error for an invalid chart name or version, or if a file
/// cannot be read or written.
pub fn run(app: &AppContext, args: &ChartArgs) -> Result<ExitCode> {
    let options = ChartOptions::new(
        &args.chart_name,
        &args.chart_version,
        args.app_version.as_deref(),
    )?;
    let base = chart_files()?;
    let request = ChartRequest {
        options: &options,
        out_dir: &args.out_dir,
        base: &base,
        templates_dir: args.templates_dir.as_deref(),
    };
    let written = chart_service::generate_chart(&request, &app.fs, &app.reporter())?;

    if app.is_json() {
        let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        println!(
            "{}",
            json::to_pretty(&serde_json::json!({
                "name": options.name,
                "version": options.version.to_string(),
                "appVersion": options.app_version,
                "files": files,
            }))?
        );
    }
    Ok(ExitCode::SUCCESS)
}
