//! Shared components - common types, errors and configuration

pub mod config;
pub mod errors;
pub mod types;
