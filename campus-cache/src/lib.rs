//! Campus Cache - Freshness Cache for Remote Collections
//!
//! Serves institution-scoped collections (users, clients) from memory with a
//! bounded freshness window, polls them in the background, and tells
//! listeners when their content actually changes. Transport is abstracted
//! behind [`CollectionFetcher`]; the REST implementation lives in
//! `campus-client`.

pub mod cache;
pub mod jobs;

pub use cache::{
    CachePeek, CacheRead, CacheStats, CacheStatsSnapshot, CachedRecord, ChangeNotifier,
    CollectionChanged, CollectionFetcher, EntryState, Fingerprint, FreshnessCache,
    SubscriptionId,
};
pub use jobs::{BackgroundRefresher, RefreshHandle, TickOutcome};

pub use campus_core::{
    CacheConfig, CampusError, CampusResult, CollectionKey, FetchError, InstitutionId,
};
