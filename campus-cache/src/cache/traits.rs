//! Fetcher trait, cacheable record marker and cache statistics.

use async_trait::async_trait;
use campus_core::{CollectionKey, FetchError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Marker trait for records that can live in a cached collection.
///
/// Records are opaque to the cache apart from needing a JSON form for
/// fingerprinting. They must be `Send + Sync + 'static` because snapshots are
/// shared with the background refresher and with listeners.
pub trait CachedRecord: Clone + Serialize + Send + Sync + 'static {}

impl<T> CachedRecord for T where T: Clone + Serialize + Send + Sync + 'static {}

/// Retrieves the authoritative collection for a key.
///
/// This abstracts over the transport; the REST implementation lives in
/// `campus-client`, tests use scripted fetchers.
#[async_trait]
pub trait CollectionFetcher<T: CachedRecord>: Send + Sync {
    /// Fetch the full collection for `key`.
    async fn fetch_collection(&self, key: &CollectionKey) -> Result<Vec<T>, FetchError>;
}

#[async_trait]
impl<T, F> CollectionFetcher<T> for Arc<F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + ?Sized,
{
    async fn fetch_collection(&self, key: &CollectionKey) -> Result<Vec<T>, FetchError> {
        (**self).fetch_collection(key).await
    }
}

/// Counters describing cache activity since construction.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads answered from a fresh entry.
    pub hits: AtomicU64,
    /// Reads that went to the remote fetcher.
    pub misses: AtomicU64,
    /// Reads that fell back to a stale entry after a failed fetch.
    pub stale_served: AtomicU64,
    /// Failed remote fetches, foreground and background.
    pub fetch_errors: AtomicU64,
    /// Background ticks that performed a fetch.
    pub background_ticks: AtomicU64,
    /// Background ticks whose content matched the cached fingerprint.
    pub unchanged_ticks: AtomicU64,
    /// Background ticks that replaced the collection.
    pub changes_detected: AtomicU64,
    /// Fetch results dropped because the key was invalidated mid-flight.
    pub discarded_results: AtomicU64,
    /// Calls to `invalidate`.
    pub invalidations: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            background_ticks: self.background_ticks.load(Ordering::Relaxed),
            unchanged_ticks: self.unchanged_ticks.load(Ordering::Relaxed),
            changes_detected: self.changes_detected.load(Ordering::Relaxed),
            discarded_results: self.discarded_results.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of cache counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stale_served: u64,
    pub fetch_errors: u64,
    pub background_ticks: u64,
    pub unchanged_ticks: u64,
    pub changes_detected: u64,
    pub discarded_results: u64,
    pub invalidations: u64,
}

impl CacheStatsSnapshot {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
