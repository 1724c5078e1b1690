//! Configuration loading for Campus clients.
//!
//! All fields are required unless explicitly marked optional. Cache tunables
//! fall back to the library defaults when the `[cache]` table is omitted.

use campus_core::constants::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_NOTIFY_CAPACITY, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_TTL_MS,
};
use campus_core::{CacheConfig, CollectionKey, InstitutionId};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "CAMPUS_CLIENT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub institution_id: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("token", &"[REDACTED]").finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_notify_capacity() -> usize {
    DEFAULT_NOTIFY_CAPACITY
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or CAMPUS_CLIENT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        InstitutionId::new(self.institution_id.clone()).map_err(|e| ConfigError::InvalidValue {
            field: "institution_id",
            reason: e.to_string(),
        })?;
        if self.auth.token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.token",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        self.cache_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "cache",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cache tunables described by the `[cache]` table.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_ttl(Duration::from_millis(self.cache.ttl_ms))
            .with_refresh_interval(Duration::from_millis(self.cache.refresh_interval_ms))
            .with_fetch_timeout(Duration::from_millis(self.cache.fetch_timeout_ms))
            .with_notify_capacity(self.cache.notify_capacity)
    }

    /// Key for the configured institution and token.
    pub fn collection_key(&self) -> campus_core::CampusResult<CollectionKey> {
        CollectionKey::parse(self.institution_id.clone(), self.auth.token.clone())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        api_base_url = "https://console.example.edu"
        institution_id = "inst-1"
        request_timeout_ms = 5000

        [auth]
        token = "secret-token"
    "#;

    #[test]
    fn test_minimal_config_uses_cache_defaults() {
        let config = ClientConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!config.log_json);

        let key = config.collection_key().unwrap();
        assert_eq!(key.institution().as_str(), "inst-1");
    }

    #[test]
    fn test_cache_table_overrides() {
        let toml = format!(
            "{}\n[cache]\nttl_ms = 1000\nrefresh_interval_ms = 250\n",
            MINIMAL
        );
        let config = ClientConfig::from_toml(&toml).unwrap();
        let cache = config.cache_config();
        assert_eq!(cache.ttl, Duration::from_millis(1000));
        assert_eq!(cache.refresh_interval, Duration::from_millis(250));
        assert_eq!(cache.fetch_timeout, Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let toml = format!("{}\nsurprise = true\n", MINIMAL);
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_token_rejected() {
        let toml = MINIMAL.replace("secret-token", " ");
        match ClientConfig::from_toml(&toml) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "auth.token"),
            other => panic!("expected auth.token error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_cache_ttl_rejected() {
        let toml = format!("{}\n[cache]\nttl_ms = 0\n", MINIMAL);
        match ClientConfig::from_toml(&toml) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "cache"),
            other => panic!("expected cache error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let config = ClientConfig::from_toml(MINIMAL).unwrap();
        assert!(!format!("{:?}", config).contains("secret-token"));
    }
}
