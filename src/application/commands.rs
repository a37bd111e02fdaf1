//! CLI commands and handlers
use std::sync::Arc;
use std::time::Duration;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use crate::application::health_monitor::{HealthMonitor, HealthStatus};
use crate::domain::connection::ConnectionManager;
use crate::domain::environment::Environment;
use crate::infrastructure::api_clients::PoolListClient;
use crate::infrastructure::blockchain::SolanaConnectionFactory;
use crate::shared::config::ConfigOverrides;
use crate::shared::errors::{AppError, MonitorError};
use crate::shared::types::AppConfig;

#[derive(Parser)]
#[command(name = "rpc-failover", version)]
#[command(about = "Solana RPC connection manager with endpoint failover")]
pub struct Cli {
    /// Path to TOML config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Deployment environment (development, testnet, production)
    #[arg(long, global = true)]
    pub environment: Option<Environment>,

    /// RPC endpoint, repeat for fallbacks; first one is the primary
    #[arg(long = "rpc-url", global = true)]
    pub rpc_urls: Vec<String>,

    /// Liveness probe deadline in seconds
    #[arg(long, global = true)]
    pub probe_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            environment: self.environment,
            rpc_urls: self.rpc_urls.clone(),
            probe_timeout_secs: self.probe_timeout_secs,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the environment and its endpoint list
    Endpoints,

    /// Probe the primary endpoint once, failing over if it is down
    Probe,

    /// Walk the endpoint list until a healthy endpoint is found
    Cycle,

    /// Keep validating the active endpoint
    Watch {
        /// Seconds between checks (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// List liquidity pools from the pool list API
    Pools {
        /// Base token mint to search for
        #[arg(long, requires = "quote")]
        base: Option<String>,

        /// Quote token mint to search for
        #[arg(long, requires = "base")]
        quote: Option<String>,

        /// Limit number of pools to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: AppConfig) -> Result<(), AppError> {
        match command {
            Commands::Endpoints => Self::execute_endpoints_command(&config),
            Commands::Probe => Self::execute_probe_command(config).await,
            Commands::Cycle => Self::execute_cycle_command(config).await,
            Commands::Watch { interval, duration } => {
                Self::execute_watch_command(interval, duration, config).await
            }
            Commands::Pools { base, quote, limit } => {
                Self::execute_pools_command(base, quote, limit, config).await
            }
        }
    }

    fn build_manager(config: &AppConfig) -> Arc<ConnectionManager<SolanaConnectionFactory>> {
        let factory = SolanaConnectionFactory::new(config.network.commitment, config.network.request_timeout);
        Arc::new(
            ConnectionManager::new(config.network.endpoints.clone(), factory)
                .with_probe_timeout(config.network.probe_timeout),
        )
    }

    fn execute_endpoints_command(config: &AppConfig) -> Result<(), AppError> {
        info!("🌐 Environment: {}", config.environment.display_name());
        for (i, url) in config.network.endpoints.iter().enumerate() {
            let role = if i == 0 { "primary" } else { "fallback" };
            info!("   {}. {} ({})", i + 1, url, role);
        }
        info!("   Probe timeout: {:?}", config.network.probe_timeout);
        info!("   Commitment: {:?}", config.network.commitment.commitment);
        Ok(())
    }

    async fn execute_probe_command(config: AppConfig) -> Result<(), AppError> {
        let manager = Self::build_manager(&config);
        let monitor = HealthMonitor::new(manager, config.monitor);
        match monitor.check_once().await {
            HealthStatus::Healthy { endpoint } => info!("✅ Using {}", endpoint),
            HealthStatus::FailedOver { to, .. } => info!("➡️  Next candidate is {}", to),
            HealthStatus::Exhausted { reset_to } => warn!("Back on primary {}", reset_to),
        }
        Ok(())
    }

    async fn execute_cycle_command(config: AppConfig) -> Result<(), AppError> {
        let manager = Self::build_manager(&config);
        let attempts = manager.endpoints().len();
        let monitor = HealthMonitor::new(manager, config.monitor);

        // one failover pass, the last check may report exhaustion
        for _ in 0..=attempts {
            match monitor.check_once().await {
                HealthStatus::Healthy { endpoint } => {
                    info!("✅ Healthy endpoint: {}", endpoint);
                    return Ok(());
                }
                HealthStatus::FailedOver { .. } => continue,
                HealthStatus::Exhausted { .. } => break,
            }
        }

        error!("❌ No healthy endpoint among {}", attempts);
        Err(MonitorError::AllEndpointsUnreachable(1).into())
    }

    async fn execute_watch_command(
        interval: Option<u64>,
        duration: Option<u64>,
        mut config: AppConfig,
    ) -> Result<(), AppError> {
        if let Some(secs) = interval {
            config.monitor.interval = Duration::from_secs(secs.max(1));
        }

        let manager = Self::build_manager(&config);
        let monitor = Arc::new(HealthMonitor::new(manager, config.monitor));

        if let Some(duration_secs) = duration {
            info!("⏱️  Watching for {} seconds", duration_secs);
            let stopper = monitor.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(duration_secs)).await;
                stopper.stop();
            });
        }

        let stats = monitor.run().await?;
        info!(
            "📊 Checks: {}, healthy: {}, failovers: {}, exhaustions: {} ({:.1}% healthy)",
            stats.checks,
            stats.healthy_checks,
            stats.failovers,
            stats.exhaustions,
            stats.success_rate() * 100.0
        );
        Ok(())
    }

    async fn execute_pools_command(
        base: Option<String>,
        quote: Option<String>,
        limit: usize,
        config: AppConfig,
    ) -> Result<(), AppError> {
        let client = PoolListClient::new(config.pools.url, config.pools.ttl);

        if let (Some(base), Some(quote)) = (base, quote) {
            match client.find_pool(&base, &quote).await? {
                Some(pool) => info!(
                    "✅ Pool {} (LP {}, decimals {}/{})",
                    pool.id, pool.lp_mint, pool.base_decimals, pool.quote_decimals
                ),
                None => warn!("No pool found for {} / {}", base, quote),
            }
            return Ok(());
        }

        let pools = client.get_pools().await?;
        info!("📋 {} pools (showing {})", pools.len(), limit.min(pools.len()));
        for (i, pool) in pools.iter().take(limit).enumerate() {
            info!(
                "   {}. {} {} <-> {}",
                i + 1,
                pool.id,
                pool.base_mint,
                pool.quote_mint
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from([
            "rpc-failover",
            "--environment",
            "testnet",
            "--rpc-url",
            "https://a.example",
            "--rpc-url",
            "https://b.example",
            "watch",
            "--duration",
            "60",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.environment, Some(Environment::Testnet));
        assert_eq!(overrides.rpc_urls.len(), 2);
        assert!(matches!(cli.command, Commands::Watch { duration: Some(60), interval: None }));
    }

    #[test]
    fn test_pools_requires_both_mints() {
        assert!(Cli::try_parse_from(["rpc-failover", "pools", "--base", "mintA"]).is_err());
        assert!(Cli::try_parse_from(["rpc-failover", "pools", "--base", "a", "--quote", "b"]).is_ok());
    }

    #[test]
    fn test_endpoints_command() {
        let config = AppConfig::for_environment(Environment::Production);
        assert!(CommandExecutor::execute_endpoints_command(&config).is_ok());
    }
}
