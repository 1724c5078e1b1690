//! Background jobs for the cache.
//!
//! - `refresh`: per-key recurring refresh of cached collections

pub mod refresh;

pub use refresh::{BackgroundRefresher, RefreshHandle, TickOutcome};
