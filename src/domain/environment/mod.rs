//! Environment domain - deployment environments and their endpoint tables

mod endpoints;

pub use endpoints::EndpointSet;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::shared::errors::ConfigError;

/// Environment variable selecting the deployment environment
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testnet,
    Production,
}

impl Environment {
    /// Resolve the environment from `APP_ENVIRONMENT`.
    /// Unknown values fall back to development.
    pub fn current() -> Self {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => Self::parse_or_default(&value),
            Err(_) => Self::Development,
        }
    }

    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("Unknown environment {}, falling back to development", value);
            Self::Development
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testnet => "testnet",
            Self::Production => "production",
        }
    }

    /// Human readable name for status output
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Development => "Development (Devnet)",
            Self::Testnet => "Testnet",
            Self::Production => "Production (Mainnet)",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Built-in RPC endpoints for this environment
    pub fn rpc_endpoints(&self) -> EndpointSet {
        let (primary, fallbacks): (&str, &[&str]) = match self {
            Self::Development => (
                "https://api.devnet.solana.com",
                &["https://devnet.genesysgo.net", "https://api.metaplex.solana.com"],
            ),
            Self::Testnet => (
                "https://api.testnet.solana.com",
                &["https://testnet.genesysgo.net"],
            ),
            Self::Production => (
                "https://api.mainnet-beta.solana.com",
                &[
                    "https://solana-api.projectserum.com",
                    "https://mainnet.rpcpool.com",
                    "https://ssc-dao.genesysgo.net",
                ],
            ),
        };

        let mut urls = vec![primary.to_string()];
        urls.extend(fallbacks.iter().map(|s| s.to_string()));
        EndpointSet::from_urls(urls).expect("built-in endpoint tables are valid")
    }

    /// Built-in off-chain API endpoints for this environment
    pub fn api_endpoints(&self) -> ApiEndpoints {
        // Devnet has too few pools, every environment reads mainnet pool data
        ApiEndpoints {
            jupiter_quote: "https://quote-api.jup.ag/v6/quote".to_string(),
            jupiter_swap: "https://quote-api.jup.ag/v6/swap".to_string(),
            raydium_pool_info: RAYDIUM_POOL_INFO_URL.to_string(),
        }
    }
}

pub const RAYDIUM_POOL_INFO_URL: &str = "https://api.raydium.io/v2/sdk/liquidity/mainnet.json";

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "devnet" | "dev" => Ok(Self::Development),
            "testnet" => Ok(Self::Testnet),
            "production" | "mainnet" | "mainnet-beta" => Ok(Self::Production),
            other => Err(ConfigError::InvalidValue(format!("environment {}", other))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Off-chain API endpoints used alongside the RPC connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    pub jupiter_quote: String,
    pub jupiter_swap: String,
    pub raydium_pool_info: String,
}
