//! Configuration loading: config file, CLI overrides and environment variable

use std::fs;
use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use tracing::debug;
use crate::domain::environment::{EndpointSet, Environment, ENVIRONMENT_VAR};
use crate::infrastructure::blockchain::parse_commitment;
use crate::shared::errors::ConfigError;
use crate::shared::types::AppConfig;

/// Contents of the TOML config file, every section optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub environment: Option<String>,
    pub rpc: RpcSection,
    pub monitor: MonitorSection,
    pub pools: PoolsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcSection {
    /// Replaces the environment's built-in endpoint table when set
    pub primary: Option<String>,
    pub fallbacks: Vec<String>,
    pub probe_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub commitment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    pub interval_secs: Option<u64>,
    pub max_consecutive_exhaustions: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolsSection {
    pub url: Option<String>,
    pub ttl_secs: Option<u64>,
}

/// Values given on the command line, highest priority
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub environment: Option<Environment>,
    /// First URL becomes the primary, the rest fallbacks
    pub rpc_urls: Vec<String>,
    pub probe_timeout_secs: Option<u64>,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<FileConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve with priority: CLI overrides > config file > `APP_ENVIRONMENT` > defaults
    pub fn resolve(file: FileConfig, overrides: ConfigOverrides) -> Result<AppConfig, ConfigError> {
        Self::resolve_with_env(file, overrides, std::env::var(ENVIRONMENT_VAR).ok())
    }

    pub fn resolve_with_env(
        file: FileConfig,
        overrides: ConfigOverrides,
        env_value: Option<String>,
    ) -> Result<AppConfig, ConfigError> {
        let environment = match (overrides.environment, &file.environment) {
            (Some(env), _) => env,
            (None, Some(value)) => value.parse()?,
            (None, None) => env_value
                .as_deref()
                .map(Environment::parse_or_default)
                .unwrap_or_default(),
        };
        debug!("Resolved environment: {}", environment);

        let mut config = AppConfig::for_environment(environment);

        if !overrides.rpc_urls.is_empty() {
            config.network.endpoints = EndpointSet::from_urls(overrides.rpc_urls)?;
        } else if let Some(primary) = file.rpc.primary {
            config.network.endpoints = EndpointSet::new(primary, file.rpc.fallbacks)?;
        }

        if let Some(secs) = overrides.probe_timeout_secs.or(file.rpc.probe_timeout_secs) {
            config.network.probe_timeout = positive_secs("probe_timeout_secs", secs)?;
        }
        if let Some(secs) = file.rpc.request_timeout_secs {
            config.network.request_timeout = positive_secs("request_timeout_secs", secs)?;
        }
        if let Some(commitment) = file.rpc.commitment {
            config.network.commitment = parse_commitment(&commitment)?;
        }

        if let Some(secs) = file.monitor.interval_secs {
            config.monitor.interval = positive_secs("interval_secs", secs)?;
        }
        if let Some(max) = file.monitor.max_consecutive_exhaustions {
            if max == 0 {
                return Err(ConfigError::InvalidValue(
                    "max_consecutive_exhaustions must be at least 1".to_string(),
                ));
            }
            config.monitor.max_consecutive_exhaustions = max;
        }

        if let Some(url) = file.pools.url {
            config.pools.url = url;
        }
        if let Some(secs) = file.pools.ttl_secs {
            config.pools.ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn positive_secs(name: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue(format!("{} must be greater than zero", name)));
    }
    Ok(Duration::from_secs(secs))
}
