//! Infrastructure layer - concrete RPC and HTTP clients

pub mod api_clients;
pub mod blockchain;
