//! Content fingerprints for change detection.
//!
//! A fingerprint is a 128-bit digest of a collection's canonical JSON form.
//! Records are first lowered to `serde_json::Value`, whose object maps are
//! ordered by key, so field order in the source type or in the server
//! response never changes the digest. Equal fingerprints are treated as
//! "no observable change"; this is a freshness signal, not an integrity check.

use campus_core::FetchError;
use serde::Serialize;
use std::fmt;

/// 128-bit content digest of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Compute the fingerprint of an ordered collection.
    ///
    /// Element order is significant: the same records in a different order
    /// produce a different fingerprint.
    pub fn of<T: Serialize>(records: &[T]) -> Result<Self, FetchError> {
        let canonical = serde_json::to_value(records).map_err(|e| FetchError::Decode {
            reason: format!("collection is not representable as JSON: {}", e),
        })?;

        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, &canonical).map_err(|e| FetchError::Decode {
            reason: format!("failed to serialize collection: {}", e),
        })?;

        let digest = hasher.finalize();
        let mut prefix = [0u8; 16];
        prefix.copy_from_slice(&digest.as_bytes()[..16]);
        Ok(Self(u128::from_le_bytes(prefix)))
    }

    /// Lowercase hex rendering, suitable for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_le_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
