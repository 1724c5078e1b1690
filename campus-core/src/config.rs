//! Configuration types

use crate::constants::*;
use crate::{CampusError, CampusResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a freshness cache instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age below which a cached collection is served without refetching.
    pub ttl: Duration,
    /// How often the background refresher polls the remote collection.
    pub refresh_interval: Duration,
    /// Upper bound on a single remote fetch; expiry counts as a fetch failure.
    pub fetch_timeout: Duration,
    /// Buffered change notifications per broadcast subscriber.
    pub notify_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(DEFAULT_TTL_MS),
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the background poll cadence.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the broadcast buffer size.
    pub fn with_notify_capacity(mut self, capacity: usize) -> Self {
        self.notify_capacity = capacity;
        self
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CAMPUS_CACHE_TTL_MS` (default: 900000)
    /// - `CAMPUS_CACHE_REFRESH_INTERVAL_MS` (default: 120000)
    /// - `CAMPUS_CACHE_FETCH_TIMEOUT_MS` (default: 10000)
    /// - `CAMPUS_CACHE_NOTIFY_CAPACITY` (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ttl: env_millis(ENV_TTL_MS).unwrap_or(defaults.ttl),
            refresh_interval: env_millis(ENV_REFRESH_INTERVAL_MS)
                .unwrap_or(defaults.refresh_interval),
            fetch_timeout: env_millis(ENV_FETCH_TIMEOUT_MS).unwrap_or(defaults.fetch_timeout),
            notify_capacity: std::env::var(ENV_NOTIFY_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.notify_capacity),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - ttl, refresh_interval and fetch_timeout are positive
    /// - notify_capacity > 0 (tokio broadcast channels reject zero)
    pub fn validate(&self) -> CampusResult<()> {
        for (field, value) in [
            ("ttl", self.ttl),
            ("refresh_interval", self.refresh_interval),
            ("fetch_timeout", self.fetch_timeout),
        ] {
            if value.is_zero() {
                return Err(CampusError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: format!("{:?}", value),
                    reason: format!("{} must be positive", field),
                }));
            }
        }

        if self.notify_capacity == 0 {
            return Err(CampusError::Config(ConfigError::InvalidValue {
                field: "notify_capacity".to_string(),
                value: self.notify_capacity.to_string(),
                reason: "notify_capacity must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// =============================================================================
// TESTS
// =============================================================================
