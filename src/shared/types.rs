//! Resolved runtime settings shared across layers

use std::time::Duration;
use solana_sdk::commitment_config::CommitmentConfig;
use crate::domain::environment::{EndpointSet, Environment, RAYDIUM_POOL_INFO_URL};

/// RPC network settings
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub endpoints: EndpointSet,
    pub commitment: CommitmentConfig,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
}

impl NetworkConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            endpoints: environment.rpc_endpoints(),
            commitment: CommitmentConfig::confirmed(),
            probe_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Health monitor settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// Stop after this many failover passes in a row found no healthy endpoint
    pub max_consecutive_exhaustions: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_consecutive_exhaustions: 3,
        }
    }
}

/// Pool list client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolListConfig {
    pub url: String,
    pub ttl: Duration,
}

impl Default for PoolListConfig {
    fn default() -> Self {
        Self {
            url: RAYDIUM_POOL_INFO_URL.to_string(),
            ttl: Duration::from_secs(300),
        }
    }
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub network: NetworkConfig,
    pub monitor: MonitorConfig,
    pub pools: PoolListConfig,
}

impl AppConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            network: NetworkConfig::for_environment(environment),
            monitor: MonitorConfig::default(),
            pools: PoolListConfig {
                url: environment.api_endpoints().raydium_pool_info,
                ttl: Duration::from_secs(300),
            },
        }
    }
}
