//! Two-tier response cache with moka
//!
//! Caches decoded API responses for idempotent reads.
//!
//! # Architecture
//!
//! - **Local tier**: process-local moka cache, consulted first
//! - **Store tier**: shared [`CacheStore`] behind it, consulted on local miss
//! - **Freshness**: entries are fresh for 30 seconds from the time they were
//!   written, judged against an injectable [`Clock`]
//! - **Stale reads**: expired entries remain in the store until its own
//!   eviction removes them, and are served only as a fallback when a fresh
//!   fetch fails
//! - **Store failures**: logged and treated as misses, never surfaced
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use apsis_infra::integrations::apsis::cache::{MemoryCacheStore, ResponseCache};
//!
//! let cache = ResponseCache::new(Arc::new(MemoryCacheStore::default()));
//! cache.put("apsis_mail:api:abc", serde_json::json!({"Result": []})).await;
//! assert!(cache.get_fresh("apsis_mail:api:abc").await.is_some());
//! ```

use std::sync::Arc;
use std::time::Duration;

use apsis_common::{Clock, SystemClock};
use apsis_core::{CacheEntry, CacheStore};
use apsis_domain::constants::CACHE_TTL_SECONDS;
use apsis_domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use tracing::{debug, warn};

/// Default retention for entries in the in-memory store (1 day)
///
/// Override via `APSIS_CACHE_RETENTION_SECONDS` environment variable
pub const DEFAULT_STORE_RETENTION_SECONDS: u64 = 86_400;

/// Default max capacity for the in-memory store
///
/// Override via `APSIS_CACHE_MAX_CAPACITY` environment variable
pub const DEFAULT_STORE_MAX_CAPACITY: u64 = 10_000;

/// Max capacity of the process-local tier
pub const DEFAULT_LOCAL_MAX_CAPACITY: u64 = 1_000;

/// In-memory store configuration
#[derive(Debug, Clone)]
pub struct CacheStoreConfig {
    /// How long entries (fresh or stale) are kept before eviction
    pub retention: Duration,

    /// Maximum number of entries
    pub max_capacity: u64,
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(
                std::env::var("APSIS_CACHE_RETENTION_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_STORE_RETENTION_SECONDS),
            ),
            max_capacity: std::env::var("APSIS_CACHE_MAX_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STORE_MAX_CAPACITY),
        }
    }
}

impl CacheStoreConfig {
    /// Create config with custom retention (useful for testing)
    pub const fn with_retention(retention: Duration) -> Self {
        Self { retention, max_capacity: DEFAULT_STORE_MAX_CAPACITY }
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            retention_seconds = self.retention.as_secs(),
            max_capacity = self.max_capacity,
            "APSIS cache store configuration loaded"
        );
    }
}

/// [`CacheStore`] kept in process memory.
///
/// Generic over `Clock` so freshness can be tested with `MockClock`.
/// Eviction is moka's (retention and capacity), independent of freshness.
pub struct MemoryCacheStore<C: Clock = SystemClock> {
    entries: Cache<String, CacheEntry>,
    clock: Arc<C>,
}

impl MemoryCacheStore<SystemClock> {
    /// Store on the system clock.
    pub fn new(config: &CacheStoreConfig) -> Self {
        config.log_config();
        Self::with_clock(config, SystemClock)
    }
}

impl Default for MemoryCacheStore<SystemClock> {
    fn default() -> Self {
        Self::new(&CacheStoreConfig::default())
    }
}

impl<C: Clock> MemoryCacheStore<C> {
    /// Create a store with a custom clock (for testing)
    pub fn with_clock(config: &CacheStoreConfig, clock: C) -> Self {
        let entries =
            Cache::builder().time_to_live(config.retention).max_capacity(config.max_capacity).build();
        Self { entries, clock: Arc::new(clock) }
    }

    /// Number of entries currently held (fresh and stale).
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

#[async_trait]
impl<C: Clock + 'static> CacheStore for MemoryCacheStore<C> {
    async fn get(&self, key: &str, allow_stale: bool) -> Result<Option<CacheEntry>> {
        let now = self.clock.utc_now();
        Ok(self.entries.get(key).filter(|entry| allow_stale || entry.is_fresh_at(now)))
    }

    async fn set(&self, key: &str, payload: serde_json::Value, expires_at: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry { key: key.to_string(), payload, stored_at: self.clock.utc_now(), expires_at };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// Local tier plus backing store, with a single freshness window.
pub struct ResponseCache {
    local: Cache<String, CacheEntry>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl ResponseCache {
    /// Cache on the system clock with the default freshness window.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a cache with a custom clock (for testing)
    pub fn with_clock(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        let ttl_secs = CACHE_TTL_SECONDS.unsigned_abs();
        let local = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(DEFAULT_LOCAL_MAX_CAPACITY)
            .build();
        Self { local, store, clock, ttl: chrono::Duration::seconds(CACHE_TTL_SECONDS) }
    }

    /// Fresh payload from the local tier, then the store.
    pub async fn get_fresh(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.utc_now();

        if let Some(entry) = self.local.get(key) {
            if entry.is_fresh_at(now) {
                debug!(cache_key = key, tier = "local", "APSIS cache hit");
                return Some(entry.payload);
            }
            self.local.invalidate(key);
        }

        match self.store.get(key, false).await {
            Ok(Some(entry)) if entry.is_fresh_at(now) => {
                debug!(cache_key = key, tier = "store", "APSIS cache hit");
                let payload = entry.payload.clone();
                self.local.insert(key.to_string(), entry);
                Some(payload)
            }
            Ok(_) => {
                debug!(cache_key = key, "APSIS cache miss");
                None
            }
            Err(e) => {
                warn!(cache_key = key, error = %e, "Cache store read failed; treating as miss");
                None
            }
        }
    }

    /// Entry from the store regardless of freshness.
    pub async fn get_stale(&self, key: &str) -> Option<CacheEntry> {
        match self.store.get(key, true).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(cache_key = key, error = %e, "Cache store stale read failed");
                None
            }
        }
    }

    /// Write `payload` to both tiers, fresh for the next 30 seconds.
    pub async fn put(&self, key: &str, payload: serde_json::Value) {
        let now = self.clock.utc_now();
        let expires_at = now + self.ttl;

        let entry = CacheEntry { key: key.to_string(), payload: payload.clone(), stored_at: now, expires_at };
        self.local.insert(key.to_string(), entry);

        if let Err(e) = self.store.set(key, payload, expires_at).await {
            warn!(cache_key = key, error = %e, "Cache store write failed; local tier only");
        }
    }

    /// Drop the local tier (the store keeps its entries).
    pub fn clear_local(&self) {
        self.local.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use apsis_common::MockClock;
    use apsis_domain::ApsisError;
    use serde_json::json;

    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str, _allow_stale: bool) -> Result<Option<CacheEntry>> {
            Err(ApsisError::Internal("store offline".into()))
        }

        async fn set(&self, _key: &str, _payload: serde_json::Value, _expires_at: DateTime<Utc>) -> Result<()> {
            Err(ApsisError::Internal("store offline".into()))
        }
    }

    fn cache_with_clock() -> (ResponseCache, Arc<MemoryCacheStore<MockClock>>, MockClock) {
        let clock = MockClock::new();
        let store =
            Arc::new(MemoryCacheStore::with_clock(&CacheStoreConfig::with_retention(Duration::from_secs(3600)), clock.clone()));
        let cache = ResponseCache::with_clock(store.clone(), Arc::new(clock.clone()));
        (cache, store, clock)
    }

    #[tokio::test]
    async fn put_then_get_within_window() {
        let (cache, _store, clock) = cache_with_clock();
        cache.put("k", json!({"Result": [1]})).await;

        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get_fresh("k").await, Some(json!({"Result": [1]})));
    }

    #[tokio::test]
    async fn entries_expire_but_stay_readable_as_stale() {
        let (cache, store, clock) = cache_with_clock();
        cache.put("k", json!("payload")).await;

        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.get_fresh("k").await, None);
        assert!(store.get("k", false).await.unwrap().is_none());

        let stale = cache.get_stale("k").await.expect("stale entry");
        assert_eq!(stale.payload, json!("payload"));
        assert!(!stale.is_fresh_at(clock.utc_now()));
    }

    #[tokio::test]
    async fn store_hit_populates_local_tier() {
        let (cache, store, clock) = cache_with_clock();
        store.set("k", json!(7), clock.utc_now() + chrono::Duration::seconds(10)).await.unwrap();

        assert_eq!(cache.get_fresh("k").await, Some(json!(7)));
        assert_eq!(cache.local.get("k").map(|entry| entry.payload), Some(json!(7)));
    }

    #[tokio::test]
    async fn store_failures_degrade_to_local_tier() {
        let cache = ResponseCache::with_clock(Arc::new(FailingStore), Arc::new(MockClock::new()));

        assert_eq!(cache.get_fresh("k").await, None);
        cache.put("k", json!(true)).await;
        assert_eq!(cache.get_fresh("k").await, Some(json!(true)));
        assert!(cache.get_stale("k").await.is_none());
    }

    #[test]
    fn store_config_with_retention() {
        let config = CacheStoreConfig::with_retention(Duration::from_secs(5));
        assert_eq!(config.retention, Duration::from_secs(5));
        assert_eq!(config.max_capacity, DEFAULT_STORE_MAX_CAPACITY);
    }
}
