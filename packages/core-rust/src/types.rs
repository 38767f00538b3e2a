use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a persisted entity, stored in its `_id` field.
///
/// Always held in string form. Integer identifiers supplied by clients are
/// normalised to their decimal representation before they reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an already-normalised identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Static descriptor of a persisted entity kind.
///
/// `collection` doubles as the HTTP path segment (`/api/<collection>`) and
/// the backing table name, so it must stay a plain snake-case identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind {
    /// Model name, as used in log lines and error payloads.
    pub name: &'static str,
    /// Collection / table name.
    pub collection: &'static str,
}

impl EntityKind {
    /// Datasets exposed over the CRUD API.
    pub const DATASET: Self = Self {
        name: "Dataset",
        collection: "datasets",
    };

    /// Tutor/student pairings whose lifecycle is broadcast to subscribers.
    pub const TUTOR_STUDENT: Self = Self {
        name: "TutorStudent",
        collection: "tutor_students",
    };
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
