//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, ConfigFlags, OutputFlags};
use crate::application::services::compose_service::KubeTarget;
use crate::commands;

/// Generate deployment manifests for self-hosted deployment agents
#[derive(Parser)]
#[command(
    name = "agent-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Stack configuration file [default: ./agent-deploy.yaml]
    #[arg(
        id = "config_file",
        short,
        long = "config",
        global = true,
        env = "AGENT_DEPLOY_CONFIG",
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Override a configuration value (repeatable)
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render the in-cluster agent pool (RBAC, Deployment, Service)
    Kubernetes(commands::render::RenderArgs),

    /// Render a single agent with a Docker-in-Docker sidecar
    Dind(commands::render::RenderArgs),

    /// Resolve network and image, then render an EC2 agent instance
    Vm,

    /// Generate a Helm chart for the cluster agent pool
    Chart(commands::chart::ChartArgs),

    /// Clean engine-rendered manifests into plain Kubernetes YAML
    Normalize(commands::normalize::NormalizeArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            set,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            config: ConfigFlags {
                path: config,
                overrides: set,
            },
        });

        match command {
            Command::Kubernetes(args) => commands::render::run(&app, KubeTarget::Cluster, &args),
            Command::Dind(args) => commands::render::run(&app, KubeTarget::Dind, &args),
            Command::Vm => commands::vm::run(&app).await,
            Command::Chart(args) => commands::chart::run(&app, &args),
            Command::Normalize(args) => commands::normalize::run(&app, &args),
            Command::Config(cmd) => commands::config::run(&app, &cmd),
            Command::Version => Ok(commands::version::run(&app)),
        }
    }
}
