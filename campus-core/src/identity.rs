//! Identity types for cached collections

use crate::{CampusResult, ValidationError};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifier of an institution (the tenant that owns a collection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstitutionId(String);

impl InstitutionId {
    /// Create an institution id, rejecting blank values.
    ///
    /// The id becomes a URL path segment, so characters that would end or
    /// escape that segment are rejected too: `/`, `\`, `?`, `#`, `%`,
    /// whitespace, control characters, and the dot segments `.` and `..`.
    pub fn new(id: impl Into<String>) -> CampusResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "institution_id".to_string(),
            }
            .into());
        }
        if let Some(bad) = id.chars().find(|&c| is_reserved(c)) {
            return Err(ValidationError::InvalidValue {
                field: "institution_id".to_string(),
                reason: format!("character {:?} is not allowed in an institution id", bad),
            }
            .into());
        }
        if id == "." || id == ".." {
            return Err(ValidationError::InvalidValue {
                field: "institution_id".to_string(),
                reason: "dot segments are not institution ids".to_string(),
            }
            .into());
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
}

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer credential used to fetch a collection.
///
/// The token never appears in `Debug` output or logs.
#[derive(Clone)]
pub struct AuthToken(Arc<SecretString>);

impl AuthToken {
    /// Create a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> CampusResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "token".to_string(),
            }
            .into());
        }
        Ok(Self(Arc::new(SecretString::from(token))))
    }

    /// Reveal the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for AuthToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for AuthToken {}

impl Hash for AuthToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expose().hash(state);
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Key identifying one cached remote collection.
///
/// A key can only be built from a validated institution id and token, so an
/// empty identifier or credential is rejected before any network call.
/// Two keys are equal only if both the institution and the token match, which
/// gives every (institution, token) pair its own cache slot and refresher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    institution: InstitutionId,
    token: AuthToken,
}

impl CollectionKey {
    pub fn new(institution: InstitutionId, token: AuthToken) -> Self {
        Self { institution, token }
    }

    /// Build a key from raw strings, validating both parts.
    pub fn parse(institution: impl Into<String>, token: impl Into<String>) -> CampusResult<Self> {
        Ok(Self::new(InstitutionId::new(institution)?, AuthToken::new(token)?))
    }

    pub fn institution(&self) -> &InstitutionId {
        &self.institution
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.institution)
    }
}
