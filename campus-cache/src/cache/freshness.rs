//! Read results and introspection types.
//!
//! Every read returns a [`CacheRead`] that says where the data came from and
//! which version it is, so callers can render "may be stale" states without
//! guessing.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Freshness state of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Nothing cached; the next read fetches.
    Empty,
    /// Cached and confirmed by the remote within the TTL.
    Fresh,
    /// Cached but unconfirmed for longer than the TTL; still served when a
    /// refetch fails.
    Stale,
}

/// Result of a cache read, carrying version and provenance metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    collection: Arc<Vec<T>>,
    version: u64,
    fetched_at: DateTime<Utc>,
    served_from_cache: bool,
}

impl<T> CacheRead<T> {
    /// A read answered from the cached entry.
    pub fn from_cache(collection: Arc<Vec<T>>, version: u64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            collection,
            version,
            fetched_at,
            served_from_cache: true,
        }
    }

    /// A read answered by a remote fetch made for this call.
    pub fn from_remote(collection: Arc<Vec<T>>, version: u64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            collection,
            version,
            fetched_at,
            served_from_cache: false,
        }
    }

    /// The collection snapshot. Shared, never partially updated.
    pub fn collection(&self) -> &Arc<Vec<T>> {
        &self.collection
    }

    /// Consume the wrapper and return the shared snapshot.
    pub fn into_collection(self) -> Arc<Vec<T>> {
        self.collection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    /// Wall-clock time since the snapshot was fetched.
    pub fn staleness(&self) -> Duration {
        let now = Utc::now();
        if now > self.fetched_at {
            (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

impl<T> AsRef<[T]> for CacheRead<T> {
    fn as_ref(&self) -> &[T] {
        self.collection.as_slice()
    }
}

/// Side-effect free snapshot of a key's cache metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePeek {
    /// Whether an entry is cached.
    pub present: bool,
    /// Time since the cached collection was loaded or last changed; zero
    /// when absent.
    pub age: Duration,
    /// Time since the remote last confirmed the collection, including
    /// unchanged background checks. Freshness is measured from here.
    pub checked_age: Duration,
    /// Highest version issued for this key.
    pub version: u64,
    pub state: EntryState,
}

impl CachePeek {
    pub(crate) fn absent(version: u64) -> Self {
        Self {
            present: false,
            age: Duration::ZERO,
            checked_age: Duration::ZERO,
            version,
            state: EntryState::Empty,
        }
    }

    /// Age in whole milliseconds, for "last updated N minutes ago" displays.
    pub fn age_millis(&self) -> u64 {
        u64::try_from(self.age.as_millis()).unwrap_or(u64::MAX)
    }
}
