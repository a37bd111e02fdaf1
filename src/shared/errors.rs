//! Error handling for the application

use thiserror::Error;

/// RPC-related errors
#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("RPC request to {endpoint} failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    #[error("RPC request to {0} timed out")]
    Timeout(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Endpoint list is empty")]
    EmptyEndpoints,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Unknown commitment level: {0}")]
    InvalidCommitment(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Pool list errors
#[derive(Error, Debug)]
pub enum PoolListError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pool list endpoint returned status {0}")]
    Status(u16),

    #[error("Failed to decode pool list: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Health monitor errors
#[derive(Error, Debug, Clone)]
pub enum MonitorError {
    #[error("All RPC endpoints unreachable after {0} consecutive failover passes")]
    AllEndpointsUnreachable(u32),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Blockchain error: {0}")]
    BlockchainError(#[from] RpcError),

    #[error("Pool list error: {0}")]
    PoolListError(#[from] PoolListError),

    #[error("Monitor error: {0}")]
    MonitorError(#[from] MonitorError),
}
