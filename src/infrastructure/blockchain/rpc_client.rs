//! Solana RPC client bound to a single endpoint

use std::str::FromStr;
use std::time::Duration;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use crate::domain::connection::{ConnectionFactory, ConnectionHandle};
use crate::shared::errors::{ConfigError, RpcError};

/// Default per-request timeout for the underlying HTTP client
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse a commitment level name
pub fn parse_commitment(value: &str) -> Result<CommitmentConfig, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(ConfigError::InvalidCommitment(other.to_string())),
    }
}

/// Solana RPC client wrapper
pub struct SolanaRpcClient {
    url: String,
    client: RpcClient,
}

impl SolanaRpcClient {
    /// Create new RPC client, no request is sent until first use
    pub fn new(url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url.clone(), timeout, commitment),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    /// Underlying client for operations not wrapped here
    pub fn inner(&self) -> &RpcClient {
        &self.client
    }

    /// Get node version
    pub async fn get_version(&self) -> Result<String, RpcError> {
        self.client
            .get_version()
            .await
            .map(|v| v.solana_core)
            .map_err(|e| self.request_failed(e))
    }

    /// Get slot
    pub async fn get_slot(&self) -> Result<u64, RpcError> {
        self.client.get_slot().await.map_err(|e| self.request_failed(e))
    }

    /// Get latest blockhash
    pub async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| self.request_failed(e))
    }

    /// Get lamport balance of an account
    pub async fn get_balance(&self, address: &str) -> Result<u64, RpcError> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| RpcError::InvalidAddress(format!("{}: {}", address, e)))?;
        self.client
            .get_balance(&pubkey)
            .await
            .map_err(|e| self.request_failed(e))
    }

    fn request_failed(&self, err: impl std::fmt::Display) -> RpcError {
        RpcError::RequestFailed {
            endpoint: self.url.clone(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ConnectionHandle for SolanaRpcClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn probe(&self) -> Result<String, RpcError> {
        self.get_version().await
    }
}

/// Builds [`SolanaRpcClient`] handles with shared settings
#[derive(Debug, Clone)]
pub struct SolanaConnectionFactory {
    commitment: CommitmentConfig,
    request_timeout: Duration,
}

impl SolanaConnectionFactory {
    pub fn new(commitment: CommitmentConfig, request_timeout: Duration) -> Self {
        Self {
            commitment,
            request_timeout,
        }
    }
}

impl Default for SolanaConnectionFactory {
    fn default() -> Self {
        Self::new(CommitmentConfig::confirmed(), DEFAULT_REQUEST_TIMEOUT)
    }
}

impl ConnectionFactory for SolanaConnectionFactory {
    type Handle = SolanaRpcClient;

    fn connect(&self, endpoint: &str) -> SolanaRpcClient {
        SolanaRpcClient::new(endpoint.to_string(), self.commitment, self.request_timeout)
    }
}
