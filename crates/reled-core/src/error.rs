use thiserror::Error;

use crate::ids::RelationshipId;

pub type Result<T> = std::result::Result<T, ReledError>;

/// Operational failures.
///
/// Domain-rule violations are not errors; they live in each field's error
/// string (see [`crate::validate::Violation`]).
#[derive(Debug, Error)]
pub enum ReledError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("target does not resolve to an entity: {gid:?}")]
    UnresolvedTarget { gid: String },

    #[error("relationship {id} has been discarded")]
    Discarded { id: RelationshipId },
}

impl ReledError {
    #[must_use]
    pub fn unresolved(gid: impl Into<String>) -> Self {
        Self::UnresolvedTarget { gid: gid.into() }
    }
}
