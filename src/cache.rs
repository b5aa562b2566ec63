//! Time-bounded response cache shared by every upstream client.
//!
//! Values are stored as `postcard` bytes so one cache instance can hold
//! geocoding, timezone and forecast results side by side. Entries are
//! immutable once stored and disappear only by expiry or [`ResponseCache::clear_all`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::Instant;

use crate::config::CacheConfig;

struct StoredEntry {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// Freshness window per call class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub geocoding: Duration,
    pub timezone: Duration,
    pub forecast: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            geocoding: Duration::from_secs(3600),
            timezone: Duration::from_secs(86_400),
            forecast: Duration::from_secs(900),
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            geocoding: Duration::from_secs(config.geocoding_ttl_seconds),
            timezone: Duration::from_secs(config.timezone_ttl_seconds),
            forecast: Duration::from_secs(config.forecast_ttl_seconds),
        }
    }
}

/// Derive a cache key from an operation name and the exact query parameters
/// sent upstream.
#[must_use]
pub fn cache_key(operation: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{operation}?{query}")
}

#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a value if it exists and has not expired.
    /// Expired or undecodable entries are evicted and reported as a miss.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if Instant::now() >= entry.expires_at {
            tracing::debug!("Key found but expired");
            entries.remove(key);
            return None;
        }

        match postcard::from_bytes(&entry.payload) {
            Ok(value) => {
                tracing::debug!("Key found and still fresh");
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry: {}", e);
                entries.remove(key);
                None
            }
        }
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match postcard::to_stdvec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Value for key {} not cached: {}", key, e);
                return;
            }
        };
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            tracing::warn!("TTL overflow for key {}, not cached", key);
            return;
        };

        self.entries.lock().insert(
            key.to_string(),
            StoredEntry {
                payload,
                expires_at,
            },
        );
    }

    /// Return the fresh cached value for `key`, or run `producer` and cache
    /// its successful result for `ttl`. Failures are passed through and never
    /// stored.
    ///
    /// The lock is not held while `producer` runs, so two callers racing on the
    /// same cold key may both fetch; the later store simply overwrites.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        tracing::debug!(key, "Cache miss, fetching");
        let value = producer().await?;
        self.put(key, &value, ttl);
        Ok(value)
    }

    /// Evict every entry unconditionally.
    pub fn clear_all(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        tracing::info!("Cleared {} cache entries", count);
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.len())
            .finish()
    }
}
