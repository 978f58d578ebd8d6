//! Domain Errors
//!
//! Failures surfaced by sidebar edits, configuration and tree stores.
//! Drag and drop never fails: malformed ids and no-op drops are `None`
//! rather than errors.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    /// A group, reference or saved filter that is not there
    NotFound(String),
    /// Rejected before touching the tree: blank names, ids that would
    /// break sortable ids, unreadable config
    InvalidInput(String),
    /// The id is already used somewhere in the tree
    Conflict(String),
    /// Store or database failure. Triggers a rollback when it ends a write.
    Internal(String),
}

impl DomainError {
    /// Wrap a backend error as [`DomainError::Internal`]
    pub fn internal(e: impl fmt::Display) -> Self {
        DomainError::Internal(e.to_string())
    }

    /// The store's connection is closed or was never opened
    pub fn not_initialized() -> Self {
        DomainError::Internal("Database not initialized".to_string())
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_wraps_backend_message() {
        let err = DomainError::internal("disk full");
        assert_eq!(err, DomainError::Internal("disk full".to_string()));
        assert_eq!(err.to_string(), "Internal error: disk full");
        assert_eq!(
            DomainError::not_initialized().to_string(),
            "Internal error: Database not initialized"
        );
    }

    #[test]
    fn test_display_prefixes_kind() {
        assert_eq!(DomainError::NotFound("Group g9".into()).to_string(), "Not found: Group g9");
    }

    #[test]
    fn test_crosses_ipc_as_tagged_json() {
        let json = serde_json::to_string(&DomainError::Conflict("g1".into())).unwrap();
        assert_eq!(json, r#"{"Conflict":"g1"}"#);
        let back: DomainError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DomainError::Conflict("g1".into()));
    }
}
