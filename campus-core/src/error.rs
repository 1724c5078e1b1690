//! Error types for Campus cache operations

use std::time::Duration;
use thiserror::Error;

/// Remote fetch errors.
///
/// Every failure of the remote collaborator maps onto one of these variants,
/// including timeouts imposed by the cache itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Authentication rejected for institution {institution}: {reason}")]
    Auth { institution: String, reason: String },

    #[error("Network failure: {reason}")]
    Network { reason: String },

    #[error("Server responded with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Fetch timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },
}

impl FetchError {
    /// Returns true if retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Auth { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Validation errors raised before any network call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Campus errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CampusError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CampusError {
    /// Returns the underlying fetch error, if this is one.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for Campus operations.
pub type CampusResult<T> = Result<T, CampusError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_auth() {
        let err = FetchError::Auth {
            institution: "inst-1".to_string(),
            reason: "token expired".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("inst-1"));
        assert!(msg.contains("token expired"));
    }

    #[test]
    fn test_fetch_error_display_timeout() {
        let err = FetchError::Timeout {
            after: Duration::from_secs(10),
        };
        assert!(format!("{}", err).contains("10s"));
    }

    #[test]
    fn test_fetch_error_transience() {
        assert!(FetchError::Network {
            reason: "reset".to_string()
        }
        .is_transient());
        assert!(FetchError::Server {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!FetchError::Server {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!FetchError::Auth {
            institution: "x".to_string(),
            reason: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_campus_error_from_fetch() {
        let err: CampusError = FetchError::Network {
            reason: "refused".to_string(),
        }
        .into();
        assert!(matches!(err, CampusError::Fetch(_)));
        assert!(err.as_fetch().is_some());
        assert!(format!("{}", err).starts_with("Fetch error"));
    }

    #[test]
    fn test_campus_error_from_validation() {
        let err: CampusError = ValidationError::RequiredFieldMissing {
            field: "token".to_string(),
        }
        .into();
        assert!(matches!(err, CampusError::InvalidArgument(_)));
        assert!(err.as_fetch().is_none());
    }
}
