//! Port interface for the backing response store

use apsis_domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached response payload with its freshness deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key the entry is stored under.
    pub key: String,
    /// Decoded response payload.
    pub payload: serde_json::Value,
    /// When the payload was fetched.
    pub stored_at: DateTime<Utc>,
    /// End of freshness.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Shared cache backend (the second tier behind the in-process cache).
///
/// Expired entries stay readable until the store evicts them on its own
/// schedule; they are only requested with `allow_stale = true`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an entry. Without `allow_stale`, expired entries read as absent.
    async fn get(&self, key: &str, allow_stale: bool) -> Result<Option<CacheEntry>>;

    /// Store a payload that is fresh until `expires_at`.
    async fn set(&self, key: &str, payload: serde_json::Value, expires_at: DateTime<Utc>) -> Result<()>;
}
