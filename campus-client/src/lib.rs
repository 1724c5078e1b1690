//! Campus Client - REST Access to Institution Collections
//!
//! Typed records, a reqwest-backed fetcher for the freshness cache, and a
//! service that pairs cached reads with cache-invalidating writes.

pub mod api_client;
pub mod config;
pub mod error;
pub mod records;
pub mod service;
pub mod telemetry;

pub use api_client::{ApiClientError, ResourceClient, RestClient};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use records::{ClientRecord, Resource, StatusUpdate, UserRecord, UserRole};
pub use service::{RecordMutator, RecordService};

/// Record service backed by the REST client for both reads and writes.
pub type RestRecordService<R> = RecordService<R, ResourceClient<R>, ResourceClient<R>>;

/// Build a REST-backed record service from client configuration.
pub fn rest_service<R: Resource>(config: &ClientConfig) -> Result<RestRecordService<R>, ClientError> {
    let rest = RestClient::from_config(config)?;
    let cache = campus_cache::FreshnessCache::new(rest.resource::<R>(), config.cache_config())?;
    Ok(RecordService::new(cache, rest.resource::<R>()))
}
