use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpc_failover::application::{Cli, CommandExecutor};
use rpc_failover::shared::config::{ConfigLoader, FileConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Priority: CLI args > config file > APP_ENVIRONMENT > defaults
    let file_config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path).with_context(|| format!("load config {}", path))?,
        None => FileConfig::default(),
    };
    let config = ConfigLoader::resolve(file_config, cli.overrides()).context("resolve configuration")?;

    CommandExecutor::execute(cli.command, config).await?;
    Ok(())
}
