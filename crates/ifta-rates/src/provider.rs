//! # Rate Provider
//!
//! Supplies a rate table for every quarter, live when possible.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      get_rates(quarter)                                 │
//! │                                                                         │
//! │  no source configured? ──yes──► Builtin(fallback)        no warning     │
//! │         │                                                               │
//! │         no                                                              │
//! │         ▼                                                               │
//! │  cached and younger than TTL? ──yes──► Live(cached)                     │
//! │         │                                                               │
//! │         no                                                              │
//! │         ▼                                                               │
//! │  timeout(source.fetch(quarter))                                         │
//! │         │                                                               │
//! │         ├── Ok(table) ──► cache ──► Live(table)                         │
//! │         │                                                               │
//! │         └── Err / elapsed ──► Fallback { fallback, warning }            │
//! │                               (not cached: next call retries)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache is the only shared mutable state in the calculator. It sits
//! behind a `tokio::sync::RwLock`: concurrent readers never block each
//! other, and the write lock is held only for an insert, never across the
//! network call.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use ifta_core::{Quarter, RateTable};

use crate::config::RatesConfig;
use crate::error::{RatesError, RatesResult};
use crate::source::{HttpRateSource, RateSource};

/// Warning surfaced to the user whenever the fallback table replaces a live one.
pub const FALLBACK_WARNING: &str = "failed to load live rates; using fallback";

// =============================================================================
// Rate Fetch Result
// =============================================================================

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    Live,
    Builtin,
    Fallback,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Live => write!(f, "live"),
            RateOrigin::Builtin => write!(f, "builtin"),
            RateOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// Outcome of [`RateProvider::get_rates`].
///
/// Every variant carries a usable table. Callers only branch to show the
/// warning.
#[derive(Debug, Clone, PartialEq)]
pub enum RateFetch {
    /// Fetched from the live source (possibly served from cache).
    Live(Arc<RateTable>),
    /// No live source is configured.
    Builtin(Arc<RateTable>),
    /// The live source failed; the built-in table stands in.
    Fallback {
        table: Arc<RateTable>,
        warning: String,
    },
}

impl RateFetch {
    pub fn table(&self) -> &Arc<RateTable> {
        match self {
            RateFetch::Live(table) | RateFetch::Builtin(table) => table,
            RateFetch::Fallback { table, .. } => table,
        }
    }

    /// The non-fatal advisory, present only for `Fallback`.
    pub fn warning(&self) -> Option<&str> {
        match self {
            RateFetch::Fallback { warning, .. } => Some(warning),
            _ => None,
        }
    }

    pub fn origin(&self) -> RateOrigin {
        match self {
            RateFetch::Live(_) => RateOrigin::Live,
            RateFetch::Builtin(_) => RateOrigin::Builtin,
            RateFetch::Fallback { .. } => RateOrigin::Fallback,
        }
    }

    fn fallback(quarter: &Quarter) -> Self {
        RateFetch::Fallback {
            table: Arc::new(RateTable::fallback(quarter.clone())),
            warning: FALLBACK_WARNING.to_string(),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

#[derive(Debug, Clone)]
struct CachedTable {
    table: Arc<RateTable>,
    fetched_at: Instant,
}

/// Resolves rate tables with a bounded wait and a built-in fallback.
pub struct RateProvider {
    source: Option<Arc<dyn RateSource>>,
    timeout: Duration,
    cache_ttl: Duration,
    cache: RwLock<HashMap<Quarter, CachedTable>>,
}

impl RateProvider {
    /// Creates a provider.
    ///
    /// A `cache_ttl` of zero disables caching.
    pub fn new(source: Option<Arc<dyn RateSource>>, timeout: Duration, cache_ttl: Duration) -> Self {
        Self {
            source,
            timeout,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A provider that always serves the built-in table.
    pub fn builtin() -> Self {
        let defaults = RatesConfig::default();
        Self::new(None, defaults.timeout(), defaults.cache_ttl())
    }

    /// Builds a provider from configuration, with an HTTP source when a URL
    /// template is configured.
    pub fn from_config(config: &RatesConfig) -> RatesResult<Self> {
        let source: Option<Arc<dyn RateSource>> = match config.source_url() {
            Some(template) => Some(Arc::new(HttpRateSource::new(template)?)),
            None => None,
        };

        match &source {
            Some(s) => info!(
                source = %s.describe(),
                timeout_secs = config.source.timeout_secs,
                cache_ttl_secs = config.cache.ttl_secs,
                "Live rate source configured"
            ),
            None => info!("No live rate source configured, serving built-in rates"),
        }

        Ok(Self::new(source, config.timeout(), config.cache_ttl()))
    }

    /// Returns true if a live source is configured.
    pub fn has_live_source(&self) -> bool {
        self.source.is_some()
    }

    /// Resolves the table for `quarter`. Never fails.
    pub async fn get_rates(&self, quarter: &Quarter) -> RateFetch {
        if self.source.is_none() {
            return RateFetch::Builtin(Arc::new(RateTable::fallback(quarter.clone())));
        }

        if let Some(table) = self.cached(quarter).await {
            debug!(%quarter, "Serving cached live rates");
            return RateFetch::Live(table);
        }

        match self.fetch_live(quarter).await {
            Ok(table) => RateFetch::Live(table),
            Err(e) => {
                warn!(%quarter, error = %e, retryable = e.is_retryable(), "{}", FALLBACK_WARNING);
                RateFetch::fallback(quarter)
            }
        }
    }

    /// Fetches from the live source with the timeout applied, bypassing the
    /// cache for the read but refreshing it on success.
    pub async fn fetch_live(&self, quarter: &Quarter) -> RatesResult<Arc<RateTable>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| RatesError::InvalidConfig("no live rate source configured".into()))?;

        let table = match tokio::time::timeout(self.timeout, source.fetch(quarter)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RatesError::Timeout(
                    u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        };

        let table = Arc::new(table);
        info!(%quarter, jurisdictions = table.len(), "Loaded live rates");

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.write().await;
            cache.insert(
                quarter.clone(),
                CachedTable {
                    table: Arc::clone(&table),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(table)
    }

    async fn cached(&self, quarter: &Quarter) -> Option<Arc<RateTable>> {
        if self.cache_ttl.is_zero() {
            return None;
        }

        let cache = self.cache.read().await;
        cache
            .get(quarter)
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| Arc::clone(&entry.table))
    }

    /// Drops the cached table for `quarter`.
    pub async fn invalidate(&self, quarter: &Quarter) {
        if self.cache.write().await.remove(quarter).is_some() {
            debug!(%quarter, "Invalidated cached rates");
        }
    }

    /// Drops every cached table.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    /// Quarters with a cached table (fresh or stale), sorted.
    pub async fn cached_quarters(&self) -> Vec<Quarter> {
        let mut quarters: Vec<Quarter> = self.cache.read().await.keys().cloned().collect();
        quarters.sort();
        quarters
    }
}

impl fmt::Debug for RateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateProvider")
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}
