use anyhow::Context;
use clap::Parser;
use harvestq::agent::{default_registry, AgentBridge, ToolContext};
use harvestq::cli::{self, Cli, Commands};
use harvestq::config::AppConfig;
use harvestq::data::Fixtures;
use harvestq::logging::{init_logging, init_logging_simple};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }

    match cli.command {
        Some(Commands::Tools) => {
            init_logging_simple();
            cli::print_tools(&default_registry());
        }
        Some(Commands::Call { tool, args }) => {
            init_logging_simple();
            let bridge = AgentBridge::new(
                Arc::new(default_registry()),
                ToolContext::new(Fixtures::new(config.data.dir.clone())),
                config.watsonx.is_configured(),
            );
            cli::call_tool(&bridge, &tool, &args)?;
        }
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        None => run_server(config).await?,
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let _guard = init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {}", e);
        }
        anyhow::bail!("invalid configuration ({} problems)", errors.len());
    }

    info!(
        data_dir = %config.data.dir.display(),
        port = config.server.port,
        "starting Harvest Q"
    );
    harvestq::api::start_api_server(config).await?;
    Ok(())
}
