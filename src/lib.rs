//! Solana RPC connection manager with ordered endpoint failover

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use domain::connection::{ConnectionFactory, ConnectionHandle, ConnectionManager};
pub use domain::environment::{EndpointSet, Environment};
pub use infrastructure::blockchain::{SolanaConnectionFactory, SolanaRpcClient};
