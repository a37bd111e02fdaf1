//! Domain layer - environments, endpoints and the connection manager

pub mod connection;
pub mod environment;
