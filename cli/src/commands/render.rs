//! `agent-deploy kubernetes` / `agent-deploy dind`: render agent manifests.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::compose_service::{
    self, KubeTarget, RenderOutcome, output_dir,
};
use crate::domain::render::to_list;
use crate::output::json;

/// Arguments shared by the Kubernetes targets.
#[derive(Args)]
pub struct RenderArgs {
    /// Write one file per resource (plus a .sha256 digest) instead of
    /// printing a YAML stream. Overrides renderYamlToDirectory.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Run a Kubernetes target.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or a file cannot be written.
pub fn run(app: &AppContext, target: KubeTarget, args: &RenderArgs) -> Result<ExitCode> {
    let (cfg, manifests) = compose_service::compose_target(&app.config, target)?;
    let dir = output_dir(args.out_dir.as_deref(), &cfg);
    let outcome = compose_service::render(&manifests, dir.as_deref(), &app.fs, &app.reporter())?;

    match outcome {
        RenderOutcome::Stream(yaml) => {
            if app.is_json() {
                println!("{}", json::to_pretty(&to_list(&manifests))?);
            } else {
                print!("{yaml}");
            }
        }
        RenderOutcome::Written { dir, files } => {
            if app.is_json() {
                let summary = serde_json::json!({
                    "directory": dir.display().to_string(),
                    "files": files,
                });
                println!("{}", json::to_pretty(&summary)?);
            } else {
                app.renderer().render_written(&dir, &files);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
