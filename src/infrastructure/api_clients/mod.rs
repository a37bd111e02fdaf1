//! Clients for off-chain HTTP APIs

pub mod raydium_pool_client;

pub use raydium_pool_client::{parse_pool_list, PoolListClient, PoolSummary, DEFAULT_POOL_LIST_TTL};
