//! Timestamped catalog snapshot kept in browser storage.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::CatalogEntry;
use crate::storage::{KeyValueStore, StorageExt, keys};

/// Catalog data together with the time it was fetched.
///
/// Stored under `productsCache` as `{ "ts": <epoch-ms>, "data": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// When the data was fetched, in epoch milliseconds.
    #[serde(rename = "ts", alias = "timestamp")]
    pub timestamp: i64,
    /// Catalog entries in API order.
    pub data: Vec<CatalogEntry>,
}

impl CacheEnvelope {
    /// Whether the envelope is still valid at `now_ms`.
    ///
    /// Valid while `now - timestamp <= ttl`; the boundary itself is fresh.
    #[must_use]
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) <= ttl_ms
    }

    /// Read the envelope regardless of age.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        store.get(keys::PRODUCTS_CACHE)
    }

    /// Read the envelope only if it is fresh and non-empty.
    #[must_use]
    pub fn load_fresh(store: &dyn KeyValueStore, now_ms: i64, ttl: Duration) -> Option<Self> {
        Self::load(store).filter(|envelope| !envelope.data.is_empty() && envelope.is_fresh(now_ms, ttl))
    }

    /// Replace the stored envelope with `data` stamped at `now_ms`.
    pub fn store(store: &dyn KeyValueStore, now_ms: i64, data: &[CatalogEntry]) {
        store.set(
            keys::PRODUCTS_CACHE,
            &CacheEnvelopeRef {
                timestamp: now_ms,
                data,
            },
        );
    }
}

/// Borrowed form of [`CacheEnvelope`] so writes don't clone the catalog.
#[derive(Serialize)]
struct CacheEnvelopeRef<'a> {
    #[serde(rename = "ts")]
    timestamp: i64,
    data: &'a [CatalogEntry],
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const TEN_MINUTES: Duration = Duration::from_secs(600);
    const T: i64 = 1_700_000_000_000;

    fn envelope(timestamp: i64) -> CacheEnvelope {
        CacheEnvelope {
            timestamp,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_fresh_just_inside_ttl() {
        let nine_59 = (9 * 60 + 59) * 1000;
        assert!(envelope(T).is_fresh(T + nine_59, TEN_MINUTES));
        assert!(envelope(T).is_fresh(T + 600_000, TEN_MINUTES));
    }

    #[test]
    fn test_stale_just_past_ttl() {
        let ten_01 = (10 * 60 + 1) * 1000;
        assert!(!envelope(T).is_fresh(T + ten_01, TEN_MINUTES));
    }

    #[test]
    fn test_store_writes_ts_key() {
        let store = MemoryStore::new();
        CacheEnvelope::store(&store, T, &[]);
        let raw = store.get_raw(keys::PRODUCTS_CACHE).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["ts"], T);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_alias_accepted() {
        let store = MemoryStore::new();
        store
            .set_raw(keys::PRODUCTS_CACHE, format!(r#"{{"timestamp": {T}, "data": []}}"#))
            .unwrap();
        assert_eq!(CacheEnvelope::load(&store).unwrap().timestamp, T);
    }

    #[test]
    fn test_empty_envelope_is_not_served() {
        let store = MemoryStore::new();
        CacheEnvelope::store(&store, T, &[]);
        assert!(CacheEnvelope::load_fresh(&store, T, TEN_MINUTES).is_none());
    }
}
