//! Raydium liquidity pool list, cached for a fixed TTL

use std::time::Duration;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use crate::shared::errors::PoolListError;

pub const DEFAULT_POOL_LIST_TTL: Duration = Duration::from_secs(300);

/// Liquidity pool entry from the Raydium pool list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub base_mint: String,
    pub quote_mint: String,
    pub lp_mint: String,
    #[serde(default)]
    pub base_decimals: u8,
    #[serde(default)]
    pub quote_decimals: u8,
    #[serde(default)]
    pub lp_decimals: u8,
}

impl PoolSummary {
    /// True if the pool trades `a` against `b` in either orientation
    pub fn matches_pair(&self, a: &str, b: &str) -> bool {
        (self.base_mint == a && self.quote_mint == b) || (self.base_mint == b && self.quote_mint == a)
    }
}

#[derive(Debug, Deserialize)]
struct PoolListResponse {
    #[serde(default)]
    official: Vec<PoolSummary>,
    #[serde(default, rename = "unOfficial")]
    unofficial: Vec<PoolSummary>,
}

/// Parse the pool list JSON body, official pools first
pub fn parse_pool_list(body: &str) -> Result<Vec<PoolSummary>, PoolListError> {
    let response: PoolListResponse = serde_json::from_str(body)?;
    let mut pools = response.official;
    pools.extend(response.unofficial);
    Ok(pools)
}

#[derive(Debug, Clone)]
struct CachedPools {
    pools: Vec<PoolSummary>,
    fetched_at: DateTime<Utc>,
}

impl CachedPools {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.fetched_at < ttl,
            Err(_) => true,
        }
    }
}

/// Fetches the pool list and serves it from memory until the TTL expires
pub struct PoolListClient {
    client: Client,
    url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedPools>>,
}

impl PoolListClient {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            ttl,
            cache: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the pool list, fetching it only if the cache is missing or stale
    pub async fn get_pools(&self) -> Result<Vec<PoolSummary>, PoolListError> {
        if let Some(pools) = self.cached(Utc::now()).await {
            debug!("Serving {} pools from cache", pools.len());
            return Ok(pools);
        }

        let pools = self.fetch().await?;
        self.store(pools.clone(), Utc::now()).await;
        Ok(pools)
    }

    /// First pool trading the given mints, in either orientation
    pub async fn find_pool(&self, base_mint: &str, quote_mint: &str) -> Result<Option<PoolSummary>, PoolListError> {
        let pools = self.get_pools().await?;
        Ok(pools.into_iter().find(|p| p.matches_pair(base_mint, quote_mint)))
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn cached(&self, now: DateTime<Utc>) -> Option<Vec<PoolSummary>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.is_fresh(now, self.ttl))
            .map(|c| c.pools.clone())
    }

    async fn store(&self, pools: Vec<PoolSummary>, fetched_at: DateTime<Utc>) {
        *self.cache.write().await = Some(CachedPools { pools, fetched_at });
    }

    async fn fetch(&self) -> Result<Vec<PoolSummary>, PoolListError> {
        info!("Fetching pool list from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PoolListError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let pools = parse_pool_list(&body)?;
        info!("Fetched {} pools", pools.len());
        Ok(pools)
    }
}
