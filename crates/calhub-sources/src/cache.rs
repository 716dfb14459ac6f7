//! TTL-bounded memoization of raw calendar documents.
//!
//! Remote calendar fetches are the expensive step of every query, and their
//! results change slowly. [`DocumentCache`] keeps one raw document per
//! source, serving repeat queries without remote I/O until the entry's
//! time-to-live elapses. The cache is also capacity-bounded: when full, the
//! least-recently-used entry is displaced, which is acceptable because the
//! source set is small and static for the life of the process.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::SourceResult;

/// A cached document paired with its fetch timestamp.
#[derive(Debug, Clone)]
struct CachedDocument {
    document: String,
    fetched_at: Instant,
}

/// Shared document cache, keyed by source identity.
#[derive(Debug)]
pub struct DocumentCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, CachedDocument>>,
}

impl DocumentCache {
    /// Default entry time-to-live in seconds.
    pub const DEFAULT_TTL_SECS: u64 = 300;

    /// Default maximum number of distinct source entries.
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Creates a cache with the given TTL and capacity. A zero capacity is
    /// clamped to the default.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(Self::DEFAULT_CAPACITY).expect("nonzero"));
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached document for `key` while the entry is fresh;
    /// otherwise awaits `fetch`, stores its result and returns it.
    ///
    /// The internal lock is released while `fetch` runs, so fetches of
    /// *different* keys never serialize on each other. There is no
    /// single-flight coalescing: two concurrent cold calls for the same key
    /// may both reach the remote. Results are idempotent, so the duplicate
    /// work is accepted. Fetch failures are never cached.
    pub async fn fetch<F>(&self, key: &str, fetch: F) -> SourceResult<String>
    where
        F: Future<Output = SourceResult<String>>,
    {
        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get(key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    trace!(key = %key, "Document cache hit");
                    return Ok(entry.document.clone());
                }
            }
        }

        debug!(key = %key, "Document cache miss, fetching");
        let document = fetch.await?;

        let mut entries = self.entries.lock().await;
        entries.put(
            key.to_string(),
            CachedDocument {
                document: document.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(document)
    }

    /// True when a fresh entry exists for `key`. Does not promote the
    /// entry's recency.
    pub async fn contains_fresh(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .peek(key)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl)
    }

    /// Drops the entry for `key`, returning whether one existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().await.pop(key).is_some()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
