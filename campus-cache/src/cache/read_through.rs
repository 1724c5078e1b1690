//! Freshness cache with background refresh.
//!
//! This module implements the read path: serve a fresh snapshot from memory,
//! otherwise fetch, and keep a background refresher polling each key that
//! has been read so entries do not silently go stale between reads.

use std::sync::{Arc, Weak};

use campus_core::{CacheConfig, CampusResult, CollectionKey, FetchError, InstitutionId};
use chrono::Utc;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::entry::{CacheEntry, KeySlot, SlotFloor};
use super::fingerprint::Fingerprint;
use super::freshness::{CachePeek, CacheRead, EntryState};
use super::notify::{ChangeNotifier, CollectionChanged, SubscriptionId};
use super::traits::{CacheStats, CacheStatsSnapshot, CachedRecord, CollectionFetcher};
use crate::jobs::{BackgroundRefresher, RefreshHandle, TickOutcome};

/// Freshness cache for remote collections.
///
/// One instance serves any number of keys. Each key moves through
/// `Empty -> Fresh -> Stale -> Fresh`, and `invalidate` returns it to `Empty`
/// from any state. Cloning is cheap and clones share state.
///
/// # Example
///
/// ```ignore
/// let cache = FreshnessCache::new(rest_client, CacheConfig::from_env())?;
///
/// let read = cache.get(&key, false).await?;
/// if read.served_from_cache() {
///     // show "last updated" from cache.peek(&key).age_millis()
/// }
///
/// // After any successful write:
/// cache.invalidate(&key);
/// ```
pub struct FreshnessCache<T, F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + 'static,
{
    shared: Arc<Shared<T, F>>,
}

struct Shared<T, F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + 'static,
{
    fetcher: F,
    config: CacheConfig,
    slots: DashMap<CollectionKey, KeySlot<T>>,
    /// Counters inherited by new slots of institutions whose slots were pruned.
    floors: DashMap<InstitutionId, SlotFloor>,
    refresher: BackgroundRefresher,
    notifier: ChangeNotifier<T>,
    stats: CacheStats,
}

impl<T, F> FreshnessCache<T, F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + 'static,
{
    /// Create a cache, validating the configuration.
    pub fn new(fetcher: F, config: CacheConfig) -> CampusResult<Self> {
        config.validate()?;
        Ok(Self::build(fetcher, config))
    }

    fn build(fetcher: F, config: CacheConfig) -> Self {
        let notifier = ChangeNotifier::new(config.notify_capacity);
        Self {
            shared: Arc::new(Shared {
                fetcher,
                config,
                slots: DashMap::new(),
                floors: DashMap::new(),
                refresher: BackgroundRefresher::new(),
                notifier,
                stats: CacheStats::new(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Read the collection for `key`.
    ///
    /// - A fresh entry is returned without touching the network unless
    ///   `force_refresh` is set.
    /// - Otherwise the collection is fetched. Concurrent misses for the same
    ///   key share one fetch.
    /// - If the fetch fails and anything is cached, the cached entry is
    ///   returned with `served_from_cache = true`; with nothing cached the
    ///   fetch error is returned.
    ///
    /// Every read that returns data, including a degraded one, makes sure the
    /// key's background refresher is running.
    pub async fn get(&self, key: &CollectionKey, force_refresh: bool) -> CampusResult<CacheRead<T>> {
        if !force_refresh {
            if let Some(read) = self.shared.read_fresh(key) {
                CacheStats::incr(&self.shared.stats.hits);
                trace!(institution = %key, version = read.version(), "Cache hit");
                self.ensure_refresher(key);
                return Ok(read);
            }
        }

        let fetch_lock = self.shared.slot_mut(key).fetch_lock.clone();
        let _fetching = fetch_lock.lock().await;

        if !force_refresh {
            // Another caller may have loaded the key while we waited.
            if let Some(read) = self.shared.read_fresh(key) {
                CacheStats::incr(&self.shared.stats.hits);
                debug!(institution = %key, version = read.version(), "Cache hit after coalesced fetch");
                self.ensure_refresher(key);
                return Ok(read);
            }
        }

        let epoch = self.shared.slot_mut(key).epoch;
        CacheStats::incr(&self.shared.stats.misses);

        match self.shared.fetch(key).await {
            Ok((records, fingerprint)) => {
                let (read, stored) =
                    self.shared
                        .store_foreground(key, epoch, records, fingerprint, force_refresh);
                if stored {
                    self.ensure_refresher(key);
                }
                Ok(read)
            }
            Err(err) => {
                CacheStats::incr(&self.shared.stats.fetch_errors);
                match self.shared.read_cached(key) {
                    Some(read) => {
                        CacheStats::incr(&self.shared.stats.stale_served);
                        warn!(
                            institution = %key,
                            error = %err,
                            version = read.version(),
                            "Fetch failed, serving cached collection"
                        );
                        self.ensure_refresher(key);
                        Ok(read)
                    }
                    None => {
                        warn!(institution = %key, error = %err, "Fetch failed with nothing cached");
                        Err(err.into())
                    }
                }
            }
        }
    }

    /// Drop the entry for `key` and stop its refresher. Idempotent.
    ///
    /// Fetches already in flight for `key` will not repopulate the entry.
    pub fn invalidate(&self, key: &CollectionKey) {
        CacheStats::incr(&self.shared.stats.invalidations);
        let had_entry = match self.shared.slots.get_mut(key) {
            Some(mut slot) => {
                let had_entry = slot.entry.is_some();
                slot.clear();
                had_entry
            }
            None => false,
        };
        let stopped = self.shared.refresher.stop(key);
        debug!(institution = %key, had_entry, refresher_stopped = stopped, "Cache invalidated");
    }

    /// Invalidate every key belonging to `institution`, whatever its token.
    ///
    /// Slots left with nothing cached and no fetch in flight are then
    /// dropped, so rotated tokens do not accumulate. Their version and epoch
    /// counters are folded into a per-institution floor that any later slot
    /// for the institution starts from.
    ///
    /// Returns the number of keys that held an entry.
    pub fn invalidate_institution(&self, institution: &InstitutionId) -> usize {
        let keys: Vec<CollectionKey> = self
            .shared
            .slots
            .iter()
            .filter(|slot| slot.key().institution() == institution)
            .map(|slot| slot.key().clone())
            .collect();

        let mut cleared = 0;
        for key in &keys {
            if self.peek(key).present {
                cleared += 1;
            }
            self.invalidate(key);
        }
        let pruned = self.shared.prune_idle(institution);
        debug!(institution = %institution, cleared, pruned, "Institution invalidated");
        cleared
    }

    /// Metadata for `key` without any network call or state change.
    pub fn peek(&self, key: &CollectionKey) -> CachePeek {
        self.shared
            .slots
            .get(key)
            .map(|slot| slot.peek(self.shared.config.ttl))
            .unwrap_or_else(|| CachePeek::absent(self.shared.floor(key.institution()).version))
    }

    pub fn state(&self, key: &CollectionKey) -> EntryState {
        self.peek(key).state
    }

    /// Start the background refresher for `key`, or return the running one.
    pub fn start_refresher(&self, key: &CollectionKey) -> RefreshHandle {
        self.ensure_refresher(key)
    }

    /// Stop the background refresher for `key`. Returns false if none ran.
    pub fn stop_refresher(&self, key: &CollectionKey) -> bool {
        self.shared.refresher.stop(key)
    }

    pub fn is_refreshing(&self, key: &CollectionKey) -> bool {
        self.shared.refresher.is_running(key)
    }

    /// Register a callback for collections replaced by the background refresher.
    pub fn subscribe<L>(&self, listener: L) -> SubscriptionId
    where
        L: Fn(&CollectionChanged<T>) + Send + Sync + 'static,
    {
        self.shared.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    /// Receive change notifications over a broadcast channel.
    pub fn changes(&self) -> broadcast::Receiver<CollectionChanged<T>> {
        self.shared.notifier.receiver()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop every refresher and drop every entry.
    ///
    /// Version high-water marks are kept, so versions stay monotonic if the
    /// instance is used again.
    pub fn dispose(&self) {
        let stopped = self.shared.refresher.stop_all();
        let mut cleared = 0usize;
        for mut slot in self.shared.slots.iter_mut() {
            if slot.entry.is_some() {
                cleared += 1;
            }
            slot.clear();
        }
        debug!(refreshers_stopped = stopped, entries_cleared = cleared, "Cache disposed");
    }

    fn ensure_refresher(&self, key: &CollectionKey) -> RefreshHandle {
        let weak: Weak<Shared<T, F>> = Arc::downgrade(&self.shared);
        let tick_key = key.clone();
        self.shared
            .refresher
            .start(key, self.shared.config.refresh_interval, move || {
                let weak = weak.clone();
                let key = tick_key.clone();
                async move {
                    match weak.upgrade() {
                        Some(shared) => {
                            shared.background_tick(&key).await;
                            TickOutcome::Continue
                        }
                        None => TickOutcome::Stop,
                    }
                }
            })
    }
}

impl<T, F> Shared<T, F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + 'static,
{
    fn floor(&self, institution: &InstitutionId) -> SlotFloor {
        self.floors.get(institution).map(|f| *f).unwrap_or_default()
    }

    /// The slot for `key`, created from the institution's floor if missing.
    fn slot_mut(&self, key: &CollectionKey) -> RefMut<'_, CollectionKey, KeySlot<T>> {
        self.slots
            .entry(key.clone())
            .or_insert_with(|| KeySlot::resume(self.floor(key.institution())))
    }

    /// Drop idle slots of `institution`, raising its floor first.
    ///
    /// The floor is raised while the shard lock is held, so a slot recreated
    /// concurrently always sees it.
    fn prune_idle(&self, institution: &InstitutionId) -> usize {
        let mut pruned = 0;
        self.slots.retain(|key, slot| {
            if key.institution() != institution || !slot.is_idle() {
                return true;
            }
            let mut floor = SlotFloor::default();
            floor.absorb(slot);
            self.floors.entry(institution.clone()).or_default().raise(floor);
            pruned += 1;
            false
        });
        pruned
    }

    /// Remote fetch bounded by the configured timeout, plus its fingerprint.
    async fn fetch(&self, key: &CollectionKey) -> Result<(Vec<T>, Fingerprint), FetchError> {
        let timeout = self.config.fetch_timeout;
        let records = match tokio::time::timeout(timeout, self.fetcher.fetch_collection(key)).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout { after: timeout }),
        };
        let fingerprint = Fingerprint::of(&records)?;
        Ok((records, fingerprint))
    }

    fn read_fresh(&self, key: &CollectionKey) -> Option<CacheRead<T>> {
        let slot = self.slots.get(key)?;
        let entry = slot.entry.as_ref()?;
        if !entry.is_fresh(self.config.ttl) {
            return None;
        }
        Some(CacheRead::from_cache(
            Arc::clone(&entry.collection),
            slot.version,
            entry.fetched_at_utc,
        ))
    }

    fn read_cached(&self, key: &CollectionKey) -> Option<CacheRead<T>> {
        let slot = self.slots.get(key)?;
        let entry = slot.entry.as_ref()?;
        Some(CacheRead::from_cache(
            Arc::clone(&entry.collection),
            slot.version,
            entry.fetched_at_utc,
        ))
    }

    /// Install a foreground fetch result.
    ///
    /// Returns the read for the caller and whether it was cached. A result
    /// fetched under an older epoch is handed back but not cached.
    fn store_foreground(
        &self,
        key: &CollectionKey,
        epoch: u64,
        records: Vec<T>,
        fingerprint: Fingerprint,
        force_refresh: bool,
    ) -> (CacheRead<T>, bool) {
        let collection = Arc::new(records);
        let mut slot = self.slot_mut(key);

        if slot.epoch != epoch {
            CacheStats::incr(&self.stats.discarded_results);
            debug!(institution = %key, "Key invalidated during fetch, result not cached");
            return (CacheRead::from_remote(collection, slot.version, Utc::now()), false);
        }

        let changed = slot
            .entry
            .as_ref()
            .map(|entry| entry.fingerprint != fingerprint)
            .unwrap_or(true);
        if force_refresh || changed {
            slot.version += 1;
        }

        let entry = CacheEntry::new(Arc::clone(&collection), fingerprint);
        let fetched_at = entry.fetched_at_utc;
        slot.entry = Some(entry);

        debug!(
            institution = %key,
            version = slot.version,
            records = collection.len(),
            fingerprint = %fingerprint,
            forced = force_refresh,
            changed,
            "Collection loaded"
        );
        (CacheRead::from_remote(collection, slot.version, fetched_at), true)
    }

    /// One background poll for `key`.
    async fn background_tick(&self, key: &CollectionKey) {
        let epoch = match self.slots.get(key) {
            Some(slot) if slot.entry.is_some() => slot.epoch,
            _ => {
                trace!(institution = %key, "Nothing cached, skipping refresh tick");
                return;
            }
        };

        CacheStats::incr(&self.stats.background_ticks);
        let (records, fingerprint) = match self.fetch(key).await {
            Ok(fetched) => fetched,
            Err(err) => {
                CacheStats::incr(&self.stats.fetch_errors);
                warn!(institution = %key, error = %err, "Background refresh failed, keeping cached collection");
                return;
            }
        };

        let event = {
            let Some(mut slot) = self.slots.get_mut(key) else {
                return;
            };
            if slot.epoch != epoch {
                CacheStats::incr(&self.stats.discarded_results);
                debug!(institution = %key, "Key invalidated during refresh, result dropped");
                return;
            }

            let unchanged = match slot.entry.as_mut() {
                Some(entry) if entry.fingerprint == fingerprint => {
                    entry.confirm();
                    true
                }
                Some(_) => false,
                None => return,
            };
            if unchanged {
                CacheStats::incr(&self.stats.unchanged_ticks);
                trace!(institution = %key, version = slot.version, "Collection unchanged");
                return;
            }

            slot.version += 1;
            let collection = Arc::new(records);
            slot.entry = Some(CacheEntry::new(Arc::clone(&collection), fingerprint));
            CacheStats::incr(&self.stats.changes_detected);
            debug!(
                institution = %key,
                version = slot.version,
                records = collection.len(),
                fingerprint = %fingerprint,
                "Background refresh detected a change"
            );

            CollectionChanged {
                key: key.clone(),
                collection,
                version: slot.version,
            }
        };

        self.notifier.notify(event);
    }
}

impl<T, F> Clone for FreshnessCache<T, F>
where
    T: CachedRecord,
    F: CollectionFetcher<T> + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // Mock fetcher returning whatever collection is currently set.
    #[derive(Default)]
    struct MockFetcher {
        records: Mutex<Vec<String>>,
        fail: Mutex<bool>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn with(records: &[&str]) -> Self {
            let fetcher = Self::default();
            fetcher.set(records);
            fetcher
        }

        fn set(&self, records: &[&str]) {
            *self.records.lock().unwrap() = records.iter().map(|r| r.to_string()).collect();
        }

        fn fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CollectionFetcher<String> for MockFetcher {
        async fn fetch_collection(&self, _key: &CollectionKey) -> Result<Vec<String>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                return Err(FetchError::Network {
                    reason: "connection refused".to_string(),
                });
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn key() -> CollectionKey {
        CollectionKey::parse("inst-1", "token").unwrap()
    }

    fn cache(fetcher: Arc<MockFetcher>) -> FreshnessCache<String, Arc<MockFetcher>> {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_millis(1000))
            .with_refresh_interval(Duration::from_secs(3600));
        FreshnessCache::new(fetcher, config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_get_fetches_and_caches() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        let read = cache.get(&key(), false).await.unwrap();
        assert!(!read.served_from_cache());
        assert_eq!(read.version(), 1);
        assert_eq!(read.collection().as_slice(), &["ada".to_string()]);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.state(&key()), EntryState::Fresh);
        assert!(cache.is_refreshing(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        tokio::time::advance(Duration::from_millis(999)).await;
        let read = cache.get(&key(), false).await.unwrap();

        assert!(read.served_from_cache());
        assert_eq!(read.version(), 1);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reload_keeps_version_when_unchanged() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(cache.state(&key()), EntryState::Stale);

        let read = cache.get(&key(), false).await.unwrap();
        assert!(!read.served_from_cache());
        assert_eq!(read.version(), 1);
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.state(&key()), EntryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_refresh_always_bumps() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        let read = cache.get(&key(), true).await.unwrap();

        assert!(!read.served_from_cache());
        assert_eq!(read.version(), 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_without_cache_propagates() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.fail(true);
        let cache = cache(Arc::clone(&fetcher));

        let err = cache.get(&key(), false).await.unwrap_err();
        assert!(matches!(err.as_fetch(), Some(FetchError::Network { .. })));
        assert!(!cache.peek(&key()).present);
        assert!(!cache.is_refreshing(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_with_stale_cache_degrades() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        tokio::time::advance(Duration::from_millis(2000)).await;
        fetcher.fail(true);

        let read = cache.get(&key(), false).await.unwrap();
        assert!(read.served_from_cache());
        assert_eq!(read.version(), 1);
        assert_eq!(cache.state(&key()), EntryState::Stale);
        assert_eq!(cache.stats().stale_served, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_resets_entry_but_not_version() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        cache.invalidate(&key());
        cache.invalidate(&key());

        let peek = cache.peek(&key());
        assert!(!peek.present);
        assert_eq!(peek.version, 1);
        assert!(!cache.is_refreshing(&key()));

        let read = cache.get(&key(), false).await.unwrap();
        assert!(!read.served_from_cache());
        assert_eq!(read.version(), 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_unknown_key_is_noop() {
        let cache = cache(Arc::new(MockFetcher::default()));
        cache.invalidate(&key());
        assert_eq!(cache.peek(&key()), CachePeek::absent(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_institution_covers_all_tokens() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));
        let a = CollectionKey::parse("inst-1", "token-a").unwrap();
        let b = CollectionKey::parse("inst-1", "token-b").unwrap();
        let other = CollectionKey::parse("inst-2", "token-a").unwrap();

        for k in [&a, &b, &other] {
            cache.get(k, false).await.unwrap();
        }

        let cleared = cache.invalidate_institution(a.institution());
        assert_eq!(cleared, 2);
        assert!(!cache.peek(&a).present);
        assert!(!cache.peek(&b).present);
        assert!(cache.peek(&other).present);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_institution_prunes_rotated_tokens() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));
        let other = CollectionKey::parse("inst-2", "token").unwrap();
        cache.get(&other, false).await.unwrap();

        // Every rotation leaves a slot behind until the institution is cleared.
        for i in 0..5 {
            let rotated = CollectionKey::parse("inst-1", format!("token-{}", i)).unwrap();
            cache.get(&rotated, false).await.unwrap();
            cache.get(&rotated, true).await.unwrap();
        }
        assert_eq!(cache.shared.slots.len(), 6);

        let institution = InstitutionId::new("inst-1").unwrap();
        assert_eq!(cache.invalidate_institution(&institution), 5);
        assert_eq!(cache.shared.slots.len(), 1);
        assert!(cache.peek(&other).present);

        // A pruned key resumes above its old version.
        let reused = CollectionKey::parse("inst-1", "token-0").unwrap();
        assert_eq!(cache.peek(&reused).version, 2);
        let read = cache.get(&reused, false).await.unwrap();
        assert_eq!(read.version(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_institution_keeps_slot_with_fetch_in_flight() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));
        let key = key();
        cache.get(&key, false).await.unwrap();

        let held = cache.shared.slots.get(&key).unwrap().fetch_lock.clone();
        let guard = held.lock().await;
        cache.invalidate_institution(key.institution());
        assert_eq!(cache.shared.slots.len(), 1);
        assert!(!cache.peek(&key).present);

        drop(guard);
        drop(held);
        cache.invalidate_institution(key.institution());
        assert!(cache.shared.slots.is_empty());
        assert_eq!(cache.peek(&key).version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_read_restarts_refresher() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        assert!(cache.stop_refresher(&key()));
        fetcher.fail(true);

        let read = cache.get(&key(), true).await.unwrap();
        assert!(read.served_from_cache());
        assert!(cache.is_refreshing(&key()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_clears_everything() {
        let fetcher = Arc::new(MockFetcher::with(&["ada"]));
        let cache = cache(Arc::clone(&fetcher));

        cache.get(&key(), false).await.unwrap();
        cache.dispose();

        assert!(!cache.peek(&key()).present);
        assert!(!cache.is_refreshing(&key()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CacheConfig::new().with_ttl(Duration::ZERO);
        assert!(FreshnessCache::<String, _>::new(MockFetcher::default(), config).is_err());
    }
}
