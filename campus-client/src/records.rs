//! Record types served by the console backend.

use campus_cache::CachedRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record type living in an institution-scoped REST collection.
pub trait Resource: CachedRecord + DeserializeOwned {
    /// Path segment of the collection under `/api/v1/institutions/{id}/`.
    const COLLECTION: &'static str;

    fn record_id(&self) -> Uuid;
}

/// Role of a console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Instructor,
    Student,
}

/// A user belonging to an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub course_ids: Vec<Uuid>,
}

impl Resource for UserRecord {
    const COLLECTION: &'static str = "users";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// A client organisation managed by an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_limit: Option<u32>,
}

impl Resource for ClientRecord {
    const COLLECTION: &'static str = "clients";

    fn record_id(&self) -> Uuid {
        self.id
    }
}

/// Body of a status toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub active: bool,
}
