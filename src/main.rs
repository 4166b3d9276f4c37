use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use stepf_deploy::cli::commands::deploy::DeployCommand;
use stepf_deploy::cli::commands::{show_how_to_deploy, Command};
use stepf_deploy::cli::{Cli, Commands};
use stepf_deploy::config::StepfDeployConfig;
use stepf_deploy::deploy::InvocationContext;
use stepf_deploy::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the config so .env entries can override it
    let env_file = StepfDeployConfig::load_env_file();
    let config = StepfDeployConfig::load()?;
    init_telemetry(&config.observability)?;

    match env_file {
        Ok(true) => info!("Loaded environment variables from .env file"),
        Ok(false) => {}
        Err(e) => warn!("Failed to load .env file: {e}"),
    }

    match cli.command {
        None => tokio::runtime::Runtime::new()?.block_on(async { show_how_to_deploy().await }),
        Some(Commands::Deploy {
            statemachine,
            stage,
            region,
            path,
        }) => {
            let context = InvocationContext::new(statemachine)
                .with_stage(stage)
                .with_region(region);
            tokio::runtime::Runtime::new()?.block_on(async {
                DeployCommand::new(context, path, config).execute().await
            })
        }
    }
}
