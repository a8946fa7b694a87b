//! `agent-deploy vm`: resolve cloud lookups and render the EC2 agent.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::vm_service;
use crate::domain::render::to_yaml_stream;
use crate::infra::aws::AwsCliInventory;
use crate::infra::command_runner::TokioCommandRunner;
use crate::output::{SpinnerReporter, json, progress};

/// Run the VM target.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, a lookup fails, or a
/// lookup matches nothing.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let spec = vm_service::load_spec(&app.config)?;
    let inventory = AwsCliInventory::new(TokioCommandRunner::default());

    let resources = if app.output.show_progress() {
        let pb = progress::spinner("resolving network...");
        let result =
            vm_service::resolve_and_compose(&spec, &inventory, &SpinnerReporter::new(&pb)).await;
        if let Err(e) = &result {
            progress::finish_error(&pb, &e.to_string());
        }
        result?
    } else {
        vm_service::resolve_and_compose(&spec, &inventory, &app.reporter()).await?
    };

    let document = resources.document();
    if app.is_json() {
        println!("{}", json::to_pretty(&document)?);
    } else {
        print!("{}", to_yaml_stream(std::slice::from_ref(&document))?);
    }
    Ok(ExitCode::SUCCESS)
}
