//! Constants for the Campus cache
//!
//! Default tunables live here so they are easy to find and to test against.

// ============================================================================
// FRESHNESS
// ============================================================================

/// Default freshness window before a foreground read refetches (15 minutes)
pub const DEFAULT_TTL_MS: u64 = 900_000;

/// Default background poll cadence (2 minutes)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 120_000;

/// Default upper bound on a single remote fetch (10 seconds)
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// NOTIFICATIONS
// ============================================================================

/// Default buffer size of the change broadcast channel
pub const DEFAULT_NOTIFY_CAPACITY: usize = 64;

// ============================================================================
// ENVIRONMENT
// ============================================================================

pub const ENV_TTL_MS: &str = "CAMPUS_CACHE_TTL_MS";
pub const ENV_REFRESH_INTERVAL_MS: &str = "CAMPUS_CACHE_REFRESH_INTERVAL_MS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "CAMPUS_CACHE_FETCH_TIMEOUT_MS";
pub const ENV_NOTIFY_CAPACITY: &str = "CAMPUS_CACHE_NOTIFY_CAPACITY";
