//! Connection domain - RPC handles and the failover connection manager

mod manager;

pub use manager::{ConnectionManager, ConnectionSnapshot, DEFAULT_PROBE_TIMEOUT};

use async_trait::async_trait;
use crate::shared::errors::RpcError;

/// Client bound to a single RPC endpoint
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Endpoint URL this handle talks to
    fn endpoint(&self) -> &str;

    /// Lightweight liveness query, returns the node version on success
    async fn probe(&self) -> Result<String, RpcError>;
}

/// Builds handles for endpoint URLs.
///
/// Construction must be local and infallible: no network I/O happens until
/// the handle is used.
pub trait ConnectionFactory: Send + Sync {
    type Handle: ConnectionHandle;

    fn connect(&self, endpoint: &str) -> Self::Handle;
}
