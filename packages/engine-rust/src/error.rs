use std::fmt;

use hashmodel_core::{MapError, RecordId};

/// Result of the best-effort cleanup that follows a failed insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    /// The record hash was never written, nothing to clean up.
    NotAttempted,
    /// The partially inserted record was removed again.
    Succeeded,
    /// Removing the partially inserted record failed too; its hash may remain
    /// in the store without a collection-list entry.
    Failed,
}

impl fmt::Display for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAttempted => "not attempted",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("create_failed: model `{model}`, record {id} (cleanup {cleanup}): {source}")]
    CreateFailed {
        model: String,
        id: RecordId,
        cleanup: Cleanup,
        #[source]
        source: anyhow::Error,
    },
    #[error("get_failed: model `{model}`, record {id}: {source}")]
    GetFailed {
        model: String,
        id: RecordId,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid page request: page {page}, limit {limit} (both must be at least 1)")]
    InvalidPage { page: u64, limit: u64 },
    #[error(transparent)]
    Mapping(#[from] MapError),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    /// Cleanup outcome for a failed insert, `None` for every other error.
    #[must_use]
    pub fn cleanup(&self) -> Option<Cleanup> {
        match self {
            Self::CreateFailed { cleanup, .. } => Some(*cleanup),
            _ => None,
        }
    }
}
