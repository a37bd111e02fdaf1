//! Connection manager with ordered endpoint failover

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use crate::domain::environment::{EndpointSet, Environment};
use super::{ConnectionFactory, ConnectionHandle};

/// Deadline for a single liveness probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Active connection state.
///
/// Always replaced as a whole so the handle and the index it belongs to
/// can never be observed out of step.
struct ConnectionState<H> {
    index: usize,
    active: Option<Arc<H>>,
    /// Bumped on every switch, identifies the connection a probe ran against
    generation: u64,
    /// Result of the most recent switch
    last_switch_advanced: bool,
}

/// Point-in-time view of the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub index: usize,
    pub endpoint: String,
    pub connected: bool,
    pub generation: u64,
}

/// Owns the endpoint list and the single active handle.
///
/// Consumers never build their own handles; they borrow the active one
/// through [`ConnectionManager::get_connection`].
pub struct ConnectionManager<F: ConnectionFactory> {
    endpoints: EndpointSet,
    factory: F,
    probe_timeout: Duration,
    state: RwLock<ConnectionState<F::Handle>>,
}

impl<F: ConnectionFactory> ConnectionManager<F> {
    /// Create a manager pointed at the primary endpoint.
    /// No handle is built until the first call to `get_connection`.
    pub fn new(endpoints: EndpointSet, factory: F) -> Self {
        Self {
            endpoints,
            factory,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            state: RwLock::new(ConnectionState {
                index: 0,
                active: None,
                generation: 0,
                last_switch_advanced: false,
            }),
        }
    }

    /// Create a manager for the built-in endpoint table of an environment
    pub fn for_environment(environment: Environment, factory: F) -> Self {
        Self::new(environment.rpc_endpoints(), factory)
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Return the active handle, building one for the current endpoint
    /// if none exists yet.
    pub async fn get_connection(&self) -> Arc<F::Handle> {
        self.active_connection().await.0
    }

    /// URL of the endpoint in use, empty until a handle has been built
    pub async fn get_current_endpoint(&self) -> String {
        let state = self.state.read().await;
        match state.active {
            Some(_) => self.endpoint_at(state.index).to_string(),
            None => String::new(),
        }
    }

    pub async fn current_index(&self) -> usize {
        self.state.read().await.index
    }

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        let state = self.state.read().await;
        ConnectionSnapshot {
            index: state.index,
            endpoint: self.endpoint_at(state.index).to_string(),
            connected: state.active.is_some(),
            generation: state.generation,
        }
    }

    /// Probe the active endpoint and fail over if it is unhealthy.
    ///
    /// Returns `true` when the endpoint is healthy or a fallback was
    /// selected, `false` when the list was exhausted and the manager
    /// went back to the primary. Never returns an error.
    pub async fn validate_connection(&self) -> bool {
        let (handle, generation) = self.active_connection().await;
        let endpoint = handle.endpoint().to_string();

        // Dropping the probe future on timeout cancels the in-flight request
        match tokio::time::timeout(self.probe_timeout, handle.probe()).await {
            Ok(Ok(version)) => {
                debug!("RPC endpoint {} healthy (version {})", endpoint, version);
                true
            }
            Ok(Err(e)) => {
                warn!("RPC endpoint {} failed liveness probe: {}", endpoint, e);
                self.fail_over(generation).await
            }
            Err(_) => {
                warn!(
                    "RPC endpoint {} did not answer within {:?}",
                    endpoint, self.probe_timeout
                );
                self.fail_over(generation).await
            }
        }
    }

    /// Move to the next endpoint on caller request.
    /// Returns `false` when the list wrapped back to the primary.
    pub async fn switch_endpoint(&self) -> bool {
        let mut state = self.state.write().await;
        self.advance(&mut state)
    }

    async fn active_connection(&self) -> (Arc<F::Handle>, u64) {
        {
            let state = self.state.read().await;
            if let Some(handle) = &state.active {
                return (handle.clone(), state.generation);
            }
        }

        let mut state = self.state.write().await;
        // Another task may have connected while we waited for the write lock
        if let Some(handle) = &state.active {
            return (handle.clone(), state.generation);
        }

        let endpoint = self.endpoint_at(state.index);
        debug!("Creating RPC connection to {}", endpoint);
        let handle = Arc::new(self.factory.connect(endpoint));
        state.active = Some(handle.clone());
        (handle, state.generation)
    }

    async fn fail_over(&self, probed_generation: u64) -> bool {
        let mut state = self.state.write().await;
        if state.generation != probed_generation {
            // The probed connection was already replaced, don't skip its successor
            debug!(
                "Ignoring stale probe result, connection already switched to {}",
                self.endpoint_at(state.index)
            );
            return state.last_switch_advanced;
        }
        self.advance(&mut state)
    }

    fn advance(&self, state: &mut ConnectionState<F::Handle>) -> bool {
        let from = state.index;
        let (next, advanced) = if from < self.endpoints.last_index() {
            (from + 1, true)
        } else {
            (0, false)
        };

        let endpoint = self.endpoint_at(next);
        let handle = Arc::new(self.factory.connect(endpoint));
        *state = ConnectionState {
            index: next,
            active: Some(handle),
            generation: state.generation + 1,
            last_switch_advanced: advanced,
        };

        if advanced {
            info!(
                "Switched RPC endpoint {} -> {}",
                self.endpoint_at(from),
                endpoint
            );
        } else {
            warn!(
                "All {} RPC endpoints tried, resetting to primary {}",
                self.endpoints.len(),
                endpoint
            );
        }
        advanced
    }

    fn endpoint_at(&self, index: usize) -> &str {
        // index is kept within bounds by `advance`
        self.endpoints.get(index).unwrap_or_else(|| self.endpoints.primary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use crate::shared::errors::RpcError;

    #[derive(Clone)]
    enum Behavior {
        Healthy,
        Failing,
        /// Answers successfully, but only after the given delay
        Slow(Duration),
        /// Signals `started`, then fails once `release` is notified
        Gated { started: Arc<Notify>, release: Arc<Notify> },
    }

    struct FakeHandle {
        endpoint: String,
        behavior: Behavior,
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConnectionHandle for FakeHandle {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        async fn probe(&self) -> Result<String, RpcError> {
            let result = match &self.behavior {
                Behavior::Healthy => Ok("2.1.14".to_string()),
                Behavior::Failing => Err(RpcError::RequestFailed {
                    endpoint: self.endpoint.clone(),
                    message: "connection refused".to_string(),
                }),
                Behavior::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok("2.1.14".to_string())
                }
                Behavior::Gated { started, release } => {
                    started.notify_one();
                    release.notified().await;
                    Err(RpcError::RequestFailed {
                        endpoint: self.endpoint.clone(),
                        message: "503".to_string(),
                    })
                }
            };
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    #[derive(Clone, Default)]
    struct FakeFactory {
        behaviors: Arc<Mutex<HashMap<String, Behavior>>>,
        created: Arc<AtomicUsize>,
        completed_probes: Arc<AtomicUsize>,
    }

    impl FakeFactory {
        fn with(self, endpoint: &str, behavior: Behavior) -> Self {
            self.behaviors.lock().unwrap().insert(endpoint.to_string(), behavior);
            self
        }

        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }
    }

    impl ConnectionFactory for FakeFactory {
        type Handle = FakeHandle;

        fn connect(&self, endpoint: &str) -> FakeHandle {
            self.created.fetch_add(1, Ordering::SeqCst);
            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(endpoint)
                .cloned()
                .unwrap_or(Behavior::Healthy);
            FakeHandle {
                endpoint: endpoint.to_string(),
                behavior,
                completed: self.completed_probes.clone(),
            }
        }
    }

    const A: &str = "https://a.example/";
    const B: &str = "https://b.example/";
    const C: &str = "https://c.example/";

    fn endpoints(urls: &[&str]) -> EndpointSet {
        EndpointSet::from_urls(urls.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_connection_is_lazy_and_reused() {
        let factory = FakeFactory::default();
        let manager = ConnectionManager::new(endpoints(&[A, B]), factory.clone());

        assert_eq!(manager.get_current_endpoint().await, "");
        assert_eq!(factory.created(), 0);

        let first = manager.get_connection().await;
        let second = manager.get_connection().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.endpoint(), A);
        assert_eq!(manager.get_current_endpoint().await, A);
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_switch_cycles_through_endpoints() {
        let manager = ConnectionManager::new(endpoints(&[A, B, C]), FakeFactory::default());
        assert_eq!(manager.current_index().await, 0);

        assert!(manager.switch_endpoint().await);
        assert_eq!(manager.current_index().await, 1);
        assert_eq!(manager.get_current_endpoint().await, B);

        assert!(manager.switch_endpoint().await);
        assert_eq!(manager.current_index().await, 2);
        assert_eq!(manager.get_current_endpoint().await, C);

        assert!(!manager.switch_endpoint().await);
        assert_eq!(manager.current_index().await, 0);
        assert_eq!(manager.get_current_endpoint().await, A);
        assert_eq!(manager.get_connection().await.endpoint(), A);
    }

    #[tokio::test]
    async fn test_n_switches_return_to_start() {
        for n in 1..=5 {
            let urls: Vec<String> = (0..n).map(|i| format!("https://node{}.example/", i)).collect();
            let manager = ConnectionManager::new(
                EndpointSet::from_urls(urls).unwrap(),
                FakeFactory::default(),
            );
            manager.switch_endpoint().await;
            let start = manager.current_index().await;
            for _ in 0..n {
                manager.switch_endpoint().await;
            }
            assert_eq!(manager.current_index().await, start, "n = {}", n);
        }
    }

    #[tokio::test]
    async fn test_single_endpoint_switch_stays_on_primary() {
        let factory = FakeFactory::default();
        let manager = ConnectionManager::new(endpoints(&[A]), factory.clone());

        assert!(!manager.switch_endpoint().await);
        assert_eq!(manager.current_index().await, 0);
        assert_eq!(manager.get_current_endpoint().await, A);
        // the handle is rebuilt even when staying on the same endpoint
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_switch_replaces_handle() {
        let manager = ConnectionManager::new(endpoints(&[A, B]), FakeFactory::default());
        let before = manager.get_connection().await;
        manager.switch_endpoint().await;
        let after = manager.get_connection().await;
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.endpoint(), B);
    }

    #[tokio::test]
    async fn test_healthy_validate_keeps_state() {
        let factory = FakeFactory::default();
        let manager = ConnectionManager::new(endpoints(&[A, B]), factory.clone());
        manager.get_connection().await;
        let before = manager.snapshot().await;

        assert!(manager.validate_connection().await);

        assert_eq!(manager.snapshot().await, before);
        assert_eq!(manager.get_current_endpoint().await, A);
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_failed_validate_advances_by_one() {
        let factory = FakeFactory::default().with(A, Behavior::Failing);
        let manager = ConnectionManager::new(endpoints(&[A, B, C]), factory);

        assert!(manager.validate_connection().await);
        assert_eq!(manager.current_index().await, 1);
        assert_eq!(manager.get_current_endpoint().await, B);
    }

    #[tokio::test]
    async fn test_validate_on_last_endpoint_wraps_and_reports_exhaustion() {
        let factory = FakeFactory::default()
            .with(A, Behavior::Failing)
            .with(B, Behavior::Failing);
        let manager = ConnectionManager::new(endpoints(&[A, B]), factory);

        assert!(manager.validate_connection().await);
        assert_eq!(manager.get_current_endpoint().await, B);

        assert!(!manager.validate_connection().await);
        assert_eq!(manager.current_index().await, 0);
        assert_eq!(manager.get_current_endpoint().await, A);
        assert_eq!(manager.get_connection().await.endpoint(), A);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_triggers_failover() {
        let factory = FakeFactory::default().with(A, Behavior::Slow(Duration::from_secs(60)));
        let manager = ConnectionManager::new(endpoints(&[A, B]), factory);

        assert!(manager.validate_connection().await);
        assert_eq!(manager.get_current_endpoint().await, B);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_probe_answer_is_discarded() {
        // answers 50ms after the deadline
        let factory = FakeFactory::default()
            .with(A, Behavior::Slow(DEFAULT_PROBE_TIMEOUT + Duration::from_millis(50)));
        let manager = ConnectionManager::new(endpoints(&[A, B, C]), factory.clone());

        assert!(manager.validate_connection().await);
        let after_failover = manager.snapshot().await;
        assert_eq!(after_failover.index, 1);
        assert_eq!(factory.created(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(manager.snapshot().await, after_failover);
        assert_eq!(factory.created(), 2);
        // the probe was cancelled, not left running
        assert_eq!(factory.completed_probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_probe_failure_does_not_switch_twice() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let factory = FakeFactory::default().with(
            A,
            Behavior::Gated {
                started: started.clone(),
                release: release.clone(),
            },
        );
        let manager = Arc::new(ConnectionManager::new(endpoints(&[A, B, C]), factory));

        let validating = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.validate_connection().await })
        };

        started.notified().await;
        assert!(manager.switch_endpoint().await);
        release.notify_one();

        assert!(validating.await.unwrap());
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.index, 1);
        assert_eq!(snapshot.endpoint, B);
        assert_eq!(manager.get_connection().await.endpoint(), B);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_builds_one_handle() {
        let factory = FakeFactory::default();
        let manager = Arc::new(ConnectionManager::new(endpoints(&[A, B]), factory.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_connection().await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(factory.created(), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_environment_constructor() {
        let manager = ConnectionManager::for_environment(Environment::Testnet, FakeFactory::default())
            .with_probe_timeout(Duration::from_secs(3));
        assert_eq!(manager.endpoints().len(), 2);
        assert_eq!(manager.probe_timeout(), Duration::from_secs(3));
        assert_eq!(manager.get_connection().await.endpoint(), "https://api.testnet.solana.com");
    }
}
