//! Solana RPC access

pub mod rpc_client;

pub use rpc_client::{parse_commitment, SolanaConnectionFactory, SolanaRpcClient, DEFAULT_REQUEST_TIMEOUT};
