//! Per-key cache state.

use super::fingerprint::Fingerprint;
use super::freshness::{CachePeek, EntryState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The cached snapshot for one key.
#[derive(Debug)]
pub(crate) struct CacheEntry<T> {
    pub collection: Arc<Vec<T>>,
    pub fingerprint: Fingerprint,
    /// When the current collection was loaded.
    pub fetched_at: Instant,
    pub fetched_at_utc: DateTime<Utc>,
    /// Last successful remote check, including unchanged background ticks.
    pub last_checked: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(collection: Arc<Vec<T>>, fingerprint: Fingerprint) -> Self {
        let now = Instant::now();
        Self {
            collection,
            fingerprint,
            fetched_at: now,
            fetched_at_utc: Utc::now(),
            last_checked: now,
        }
    }

    /// Time since the current collection was loaded.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.fetched_at)
    }

    /// Time since the remote last confirmed this collection.
    pub fn checked_age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_checked)
    }

    /// Record an unchanged remote check; the collection stays as loaded.
    pub fn confirm(&mut self) {
        self.last_checked = Instant::now();
    }

    /// Freshness runs from the last confirmation, so a refresher that keeps
    /// seeing the same content keeps the entry fresh.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.checked_age() < ttl
    }
}

/// Everything the cache tracks for a key.
///
/// `version` and `epoch` outlive the entry: invalidation drops the entry but
/// keeps the version high-water mark, and advances the epoch so fetches that
/// started earlier cannot repopulate the slot.
#[derive(Debug)]
pub(crate) struct KeySlot<T> {
    pub entry: Option<CacheEntry<T>>,
    pub version: u64,
    pub epoch: u64,
    /// Serialises foreground fetches so concurrent misses share one request.
    pub fetch_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<T> Default for KeySlot<T> {
    fn default() -> Self {
        Self::resume(SlotFloor::default())
    }
}

impl<T> KeySlot<T> {
    /// A fresh slot that continues from a pruned slot's counters.
    pub fn resume(floor: SlotFloor) -> Self {
        Self {
            entry: None,
            version: floor.version,
            epoch: floor.epoch,
            fetch_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// No entry and no foreground fetch holding the lock.
    pub fn is_idle(&self) -> bool {
        self.entry.is_none() && Arc::strong_count(&self.fetch_lock) == 1
    }

    pub fn state(&self, ttl: Duration) -> EntryState {
        match &self.entry {
            None => EntryState::Empty,
            Some(entry) if entry.is_fresh(ttl) => EntryState::Fresh,
            Some(_) => EntryState::Stale,
        }
    }

    pub fn peek(&self, ttl: Duration) -> CachePeek {
        match &self.entry {
            None => CachePeek::absent(self.version),
            Some(entry) => CachePeek {
                present: true,
                age: entry.age(),
                checked_age: entry.checked_age(),
                version: self.version,
                state: self.state(ttl),
            },
        }
    }

    /// Drop the entry and advance the epoch.
    pub fn clear(&mut self) {
        self.entry = None;
        self.epoch += 1;
    }
}

/// Counters a slot must start from after earlier slots for the same
/// institution were pruned.
///
/// `epoch` is one past the highest pruned epoch, so a background tick that
/// captured an epoch from a pruned slot can never match its replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SlotFloor {
    pub version: u64,
    pub epoch: u64,
}

impl SlotFloor {
    pub fn absorb<T>(&mut self, slot: &KeySlot<T>) {
        self.version = self.version.max(slot.version);
        self.epoch = self.epoch.max(slot.epoch + 1);
    }

    pub fn raise(&mut self, other: SlotFloor) {
        self.version = self.version.max(other.version);
        self.epoch = self.epoch.max(other.epoch);
    }
}
