//! Freshness cache for remote collections.
//!
//! Reads are served from memory while an entry is younger than the TTL and
//! fetched otherwise. A background refresher keeps polling every key that has
//! been read, and replaces the cached collection only when its content
//! fingerprint changes, so listeners are not woken for identical data.
//!
//! # Example
//!
//! ```ignore
//! let cache = FreshnessCache::new(fetcher, CacheConfig::default())?;
//! let id = cache.subscribe(|change| {
//!     println!("{} now at version {}", change.key, change.version);
//! });
//!
//! let read = cache.get(&key, false).await?;
//! println!("{} records, cached: {}", read.len(), read.served_from_cache());
//!
//! cache.unsubscribe(id);
//! cache.dispose();
//! ```

mod entry;
pub mod fingerprint;
pub mod freshness;
pub mod notify;
pub mod read_through;
pub mod traits;

pub use fingerprint::Fingerprint;
pub use freshness::{CachePeek, CacheRead, EntryState};
pub use notify::{ChangeNotifier, CollectionChanged, SubscriptionId};
pub use read_through::FreshnessCache;
pub use traits::{CacheStats, CacheStatsSnapshot, CachedRecord, CollectionFetcher};
