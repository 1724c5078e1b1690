//! Campus Core - Shared Types
//!
//! Identifiers, the error taxonomy and cache configuration. All other crates
//! depend on this one; it contains no I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod identity;

pub use config::CacheConfig;
pub use error::{CampusError, CampusResult, ConfigError, FetchError, ValidationError};
pub use identity::{AuthToken, CollectionKey, InstitutionId};
