//! Record identifiers and their generation.
//!
//! A [`RecordId`] is a non-empty string token. Freshly generated identifiers
//! are UUID v7 values rendered in hyphenated lowercase form: the leading 48 bits
//! are the Unix timestamp in milliseconds, so identifiers generated later sort
//! after identifiers generated earlier, both as UUIDs and as strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Errors from constructing a [`RecordId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("record identifier must not be empty")]
    Empty,
}

/// Identifier of a persisted record.
///
/// Always non-empty. Identifiers read back from the store are accepted as-is
/// (they need not be UUIDs); only [`RecordId::generate`] guarantees ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a new time-ordered identifier.
    ///
    /// Uses `Uuid::now_v7`, which keeps a process-wide counter so identifiers
    /// generated within the same millisecond are still strictly increasing.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().hyphenated().to_string())
    }

    /// Wraps an existing identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] if `raw` is empty.
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
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

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = IdError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Source of identifiers for newly inserted records.
///
/// The engine holds one as `Arc<dyn IdGenerator>`. The default is
/// [`TimeOrderedIds`]; tests may substitute a deterministic sequence.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier that has never been returned before.
    fn next_id(&self) -> RecordId;
}

/// Default [`IdGenerator`] producing UUID v7 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIds;

impl IdGenerator for TimeOrderedIds {
    fn next_id(&self) -> RecordId {
        RecordId::generate()
    }
}
