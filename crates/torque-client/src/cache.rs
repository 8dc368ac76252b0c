//! # Response Cache
//!
//! Time-limited cache of successful response payloads, keyed by request.
//!
//! ## Sharing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   customers list ──┐                                                   │
//! │   customer detail ─┼──► Arc<ResponseCache> ──► HashMap<key, Entry>     │
//! │   job board ───────┘         (one per app)        payload + expiry     │
//! │                                                                         │
//! │   After a write, invalidate_prefix("/api/customers") drops every       │
//! │   cached customer read at once.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads are stored as raw JSON so one cache can serve controllers with
//! different output types. Expiry uses `tokio::time::Instant`, so paused-
//! clock tests can advance past a TTL.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default time-to-live for cached payloads.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Expiry used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Shared TTL cache. Wrap in `Arc` and hand to each controller.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        ResponseCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the payload for `key` if present and not expired.
    ///
    /// An expired entry is dropped on the way out.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => {
                    debug!(key, "Cache hit");
                    return Some(entry.payload.clone());
                }
                None => {
                    debug!(key, "Cache miss");
                    return None;
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check: another task may have refreshed the entry meanwhile.
        let fresh = entries.get(key).map(|entry| entry.is_fresh(Instant::now()));
        match fresh {
            Some(true) => entries.get(key).map(|entry| entry.payload.clone()),
            Some(false) => {
                entries.remove(key);
                debug!(key, "Cache entry expired, evicted");
                None
            }
            None => None,
        }
    }

    /// Stores `payload` under `key` with the default TTL.
    pub async fn insert(&self, key: impl Into<String>, payload: Value) {
        self.insert_with_ttl(key, payload, self.ttl).await;
    }

    /// Stores `payload` under `key` for `ttl`, and sweeps out entries that
    /// have already expired.
    pub async fn insert_with_ttl(&self, key: impl Into<String>, payload: Value, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_fresh(now));
        entries.insert(key.into(), CacheEntry { payload, expires_at });
    }

    /// Removes one entry. Returns true if it existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drops every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(prefix, removed, "Invalidated cached responses");
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drops expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("/api/customers", json!([{ "id": 1 }])).await;
        cache.insert("/api/jobs", json!([])).await;

        assert_eq!(cache.get("/api/customers").await, Some(json!([{ "id": 1 }])));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("/api/customers").await, None);

        // The expired read evicted its own entry; the other one is untouched
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.purge_expired().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_sweeps_expired_entries() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        for id in 0..5 {
            cache.insert(format!("/api/customers/{}", id), json!({ "id": id })).await;
        }

        tokio::time::advance(Duration::from_secs(11)).await;
        cache.insert("/api/customers/99", json!({ "id": 99 })).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("/api/customers/99").await.is_some());
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = ResponseCache::new(Duration::from_secs(i64::MAX as u64));
        cache.insert("/api/customers", json!([])).await;
        cache
            .insert_with_ttl("/api/jobs", json!([]), Duration::MAX)
            .await;

        assert_eq!(cache.get("/api/customers").await, Some(json!([])));
        assert_eq!(cache.get("/api/jobs").await, Some(json!([])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_with_custom_ttl() {
        let cache = ResponseCache::default();
        cache
            .insert_with_ttl("/api/settings", json!({ "taxRate": 0.07 }), Duration::from_secs(5))
            .await;

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.get("/api/settings").await.is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("/api/settings").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = ResponseCache::default();
        cache.insert("/api/customers", json!([])).await;
        cache.insert("/api/customers/42", json!({ "id": 42 })).await;
        cache.insert("/api/jobs", json!([])).await;

        assert_eq!(cache.invalidate_prefix("/api/customers").await, 2);
        assert!(cache.get("/api/customers/42").await.is_none());
        assert!(cache.get("/api/jobs").await.is_some());

        assert!(cache.remove("/api/jobs").await);
        assert!(!cache.remove("/api/jobs").await);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResponseCache::default();
        cache.insert("a", json!(1)).await;
        cache.insert("b", json!(2)).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
