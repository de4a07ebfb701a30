// src/services/cache.rs

//! TTL-bounded memoization of expensive per-key lookups.
//!
//! Entries expire a fixed duration after creation, regardless of how often
//! they are read. Expired entries are purged lazily at the start of every
//! `get`. Failed lookups are never stored, so the next `get` retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;

/// Lookup called on a cache miss.
pub type FetchFn<V> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<V>> + Send + Sync>;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    created: Instant,
    value: V,
}

/// Read-through cache with a fixed time-to-live.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    fetch: FetchFn<V>,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Create a cache that fills misses with `fetch`.
    pub fn new<F, Fut>(ttl: Duration, fetch: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            fetch: Arc::new(move |key| fetch(key).boxed()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `key`, fetching and storing it on a miss.
    ///
    /// The fetch runs without holding the entry lock. Two concurrent misses
    /// on the same key may both fetch; the later insert wins.
    pub async fn get(&self, key: &str) -> Result<V> {
        self.purge().await;

        if let Some(value) = self.live(key).await {
            log::debug!("Cache hit: {}", key);
            return Ok(value);
        }

        log::debug!("Cache miss: {}", key);
        let value = (self.fetch)(key.to_string()).await?;

        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                created: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.created) < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until the next purge.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn live(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.created.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }
}
