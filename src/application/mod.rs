//! Application layer - use cases and services

pub mod commands;
pub mod health_monitor;

pub use commands::{Cli, CommandExecutor, Commands};
pub use health_monitor::{HealthMonitor, HealthStatus, MonitorStats};
