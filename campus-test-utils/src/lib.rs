//! Campus Test Utilities
//!
//! Shared test infrastructure for the Campus workspace:
//! - A scripted fetcher with failure injection and an in-flight gate
//! - Proptest generators for keys, records and cache configs
//! - Fixtures for common scenarios
//! - Assertions for Campus result types

pub use campus_cache::{
    CachePeek, CacheRead, CachedRecord, CollectionChanged, CollectionFetcher, EntryState,
    FreshnessCache,
};
pub use campus_core::{
    CacheConfig, CampusError, CampusResult, CollectionKey, FetchError, InstitutionId,
};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// TEST RECORD
// ============================================================================

/// Minimal record used by cache tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub active: bool,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
        }
    }
}

// ============================================================================
// SCRIPTED FETCHER
// ============================================================================

/// Gate that holds a fetch in flight until the test releases it.
#[derive(Debug, Default)]
pub struct FetchGate {
    entered: Notify,
    release: Notify,
}

impl FetchGate {
    /// Wait until a gated fetch has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let one gated fetch complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Fetcher returning whatever collection the test has scripted.
///
/// Every call is counted. A failure, once set, is returned by every call
/// until cleared.
#[derive(Debug)]
pub struct ScriptedFetcher<T> {
    records: Mutex<Vec<T>>,
    failure: Mutex<Option<FetchError>>,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<FetchGate>>>,
    calls: AtomicUsize,
}

impl<T> Default for ScriptedFetcher<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: Mutex::new(None),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: CachedRecord> ScriptedFetcher<T> {
    pub fn new(records: Vec<T>) -> Self {
        let fetcher = Self::default();
        fetcher.set_records(records);
        fetcher
    }

    pub fn shared(records: Vec<T>) -> Arc<Self> {
        Arc::new(Self::new(records))
    }

    pub fn set_records(&self, records: Vec<T>) {
        *lock(&self.records) = records;
    }

    pub fn fail_with(&self, error: FetchError) {
        *lock(&self.failure) = Some(error);
    }

    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Make every fetch take `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Hold subsequent fetches until the returned gate releases them.
    pub fn install_gate(&self) -> Arc<FetchGate> {
        let gate = Arc::new(FetchGate::default());
        *lock(&self.gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn remove_gate(&self) {
        *lock(&self.gate) = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: CachedRecord> CollectionFetcher<T> for ScriptedFetcher<T> {
    async fn fetch_collection(&self, _key: &CollectionKey) -> Result<Vec<T>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        Ok(lock(&self.records).clone())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Campus types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_institution_id() -> impl Strategy<Value = InstitutionId> {
        "inst-[a-z0-9]{1,12}".prop_map(|s| InstitutionId::new(s).expect("non-blank by construction"))
    }

    pub fn arb_token() -> impl Strategy<Value = String> {
        "[A-Za-z0-9]{8,32}"
    }

    pub fn arb_collection_key() -> impl Strategy<Value = CollectionKey> {
        (arb_institution_id(), arb_token()).prop_map(|(inst, token)| {
            CollectionKey::parse(inst.as_str(), token).expect("non-blank by construction")
        })
    }

    pub fn arb_member() -> impl Strategy<Value = Member> {
        (any::<u64>(), "[A-Za-z ]{1,24}", any::<bool>()).prop_map(|(id, name, active)| Member {
            id,
            name,
            active,
        })
    }

    pub fn arb_members(max: usize) -> impl Strategy<Value = Vec<Member>> {
        prop::collection::vec(arb_member(), 0..=max)
    }

    pub fn arb_valid_cache_config() -> impl Strategy<Value = CacheConfig> {
        (1u64..3_600_000, 1u64..3_600_000, 1u64..120_000, 1usize..1024).prop_map(
            |(ttl, interval, timeout, capacity)| {
                CacheConfig::new()
                    .with_ttl(Duration::from_millis(ttl))
                    .with_refresh_interval(Duration::from_millis(interval))
                    .with_fetch_timeout(Duration::from_millis(timeout))
                    .with_notify_capacity(capacity)
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;

    pub fn key(institution: &str) -> CollectionKey {
        CollectionKey::parse(institution, "test-token").expect("fixture key is valid")
    }

    pub fn roster() -> Vec<Member> {
        vec![Member::new(1, "Ada"), Member::new(2, "Grace"), Member::new(3, "Barbara")]
    }

    /// TTL of one second, refresher effectively idle.
    pub fn short_ttl_config() -> CacheConfig {
        CacheConfig::new()
            .with_ttl(Duration::from_millis(1000))
            .with_refresh_interval(Duration::from_secs(3600))
    }

    /// Refresher polling every `interval`, TTL long enough to never expire.
    pub fn polling_config(interval: Duration) -> CacheConfig {
        CacheConfig::new()
            .with_ttl(Duration::from_secs(3600))
            .with_refresh_interval(interval)
    }

    pub fn network_down() -> FetchError {
        FetchError::Network {
            reason: "connection refused".to_string(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Campus results and cache reads.

    use super::*;

    #[track_caller]
    pub fn assert_fetch_error<T: std::fmt::Debug>(result: &CampusResult<T>) {
        match result {
            Err(CampusError::Fetch(_)) => {}
            other => panic!("Expected Fetch error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_invalid_argument<T: std::fmt::Debug>(result: &CampusResult<T>) {
        match result {
            Err(CampusError::InvalidArgument(_)) => {}
            other => panic!("Expected InvalidArgument error, got: {:?}", other),
        }
    }

    /// Assert a read came from memory with the given version.
    #[track_caller]
    pub fn assert_cached<T>(read: &CacheRead<T>, version: u64) {
        assert!(read.served_from_cache(), "Expected cached read");
        assert_eq!(read.version(), version, "Wrong version");
    }

    /// Assert a read came from the remote with the given version.
    #[track_caller]
    pub fn assert_remote<T>(read: &CacheRead<T>, version: u64) {
        assert!(!read.served_from_cache(), "Expected remote read");
        assert_eq!(read.version(), version, "Wrong version");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_scripted_fetcher_counts_and_fails() {
        let fetcher = ScriptedFetcher::new(fixtures::roster());
        let key = fixtures::key("inst-1");

        assert_eq!(fetcher.fetch_collection(&key).await.unwrap().len(), 3);
        fetcher.fail_with(fixtures::network_down());
        assert!(fetcher.fetch_collection(&key).await.is_err());
        fetcher.recover();
        assert!(fetcher.fetch_collection(&key).await.is_ok());
        assert_eq!(fetcher.calls(), 3);
    }

    proptest! {
        #[test]
        fn prop_generated_configs_validate(config in generators::arb_valid_cache_config()) {
            prop_assert!(config.validate().is_ok());
        }
    }
}
