use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use crate::domain::connection::{ConnectionFactory, ConnectionHandle, ConnectionManager};
use crate::shared::errors::MonitorError;
use crate::shared::types::MonitorConfig;

/// Outcome of a single health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy { endpoint: String },
    FailedOver { from: String, to: String },
    /// Every endpoint was tried, manager is back on the primary
    Exhausted { reset_to: String },
}

/// Health check statistics
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub checks: u64,
    pub healthy_checks: u64,
    pub failovers: u64,
    pub exhaustions: u64,
    pub consecutive_exhaustions: u32,
    pub current_endpoint: String,
    pub last_check: Option<DateTime<Utc>>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, status: &HealthStatus) {
        self.checks += 1;
        self.last_check = Some(Utc::now());
        match status {
            HealthStatus::Healthy { endpoint } => {
                self.healthy_checks += 1;
                self.consecutive_exhaustions = 0;
                self.current_endpoint = endpoint.clone();
            }
            HealthStatus::FailedOver { to, .. } => {
                self.failovers += 1;
                self.current_endpoint = to.clone();
            }
            HealthStatus::Exhausted { reset_to } => {
                self.exhaustions += 1;
                self.consecutive_exhaustions += 1;
                self.current_endpoint = reset_to.clone();
            }
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.checks == 0 {
            0.0
        } else {
            self.healthy_checks as f64 / self.checks as f64
        }
    }
}

/// Periodically validates the active RPC endpoint
pub struct HealthMonitor<F: ConnectionFactory> {
    manager: Arc<ConnectionManager<F>>,
    config: MonitorConfig,
    stats: Arc<RwLock<MonitorStats>>,
    shutdown: watch::Sender<bool>,
}

impl<F: ConnectionFactory> HealthMonitor<F> {
    pub fn new(manager: Arc<ConnectionManager<F>>, config: MonitorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            manager,
            config,
            stats: Arc::new(RwLock::new(MonitorStats::new())),
            shutdown,
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager<F>> {
        &self.manager
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    /// Validate once and record the outcome
    pub async fn check_once(&self) -> HealthStatus {
        let from = self.manager.get_connection().await.endpoint().to_string();
        let advanced = self.manager.validate_connection().await;
        let current = self.manager.get_current_endpoint().await;

        let status = if !advanced {
            HealthStatus::Exhausted { reset_to: current }
        } else if current == from {
            HealthStatus::Healthy { endpoint: current }
        } else {
            HealthStatus::FailedOver { from, to: current }
        };

        match &status {
            HealthStatus::Healthy { endpoint } => info!("✅ RPC endpoint healthy: {}", endpoint),
            HealthStatus::FailedOver { from, to } => warn!("⚠️  RPC failover {} -> {}", from, to),
            HealthStatus::Exhausted { reset_to } => {
                error!("❌ All RPC endpoints unreachable, retrying from {}", reset_to)
            }
        }

        self.stats.write().await.record(&status);
        status
    }

    /// Run checks every `interval` until stopped.
    ///
    /// Fails once `max_consecutive_exhaustions` failover passes in a row
    /// found no healthy endpoint.
    pub async fn run(&self) -> Result<MonitorStats, MonitorError> {
        let mut shutdown = self.shutdown.subscribe();
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Starting RPC health monitor over {} endpoints, interval {:?}",
            self.manager.endpoints().len(),
            self.config.interval
        );

        if *shutdown.borrow() {
            return Ok(self.stats().await);
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_once().await;
                    let exhausted = self.stats.read().await.consecutive_exhaustions;
                    if exhausted >= self.config.max_consecutive_exhaustions {
                        return Err(MonitorError::AllEndpointsUnreachable(exhausted));
                    }
                }
                // the flag only ever flips to true
                _ = shutdown.changed() => {
                    info!("RPC health monitor stopped");
                    return Ok(self.stats().await);
                }
            }
        }
    }

    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}
