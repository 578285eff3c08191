//! Custom error types for SplitIt
//!
//! This module defines the error hierarchy for the ledger using thiserror.
//! Every user-facing failure can be flattened into a list of reasons with
//! [`SplitError::reasons`].

use thiserror::Error;

/// Failures raised by a ledger store
///
/// Transient variants are retried by `RetryingStore`; the rest surface
/// immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("store I/O failed: {0}")]
    Io(String),

    /// A single call exceeded the configured timeout
    #[error("store call timed out after {0} ms")]
    Timeout(u64),

    /// The backing service asked us to slow down
    #[error("store rate limit exceeded")]
    RateLimited,

    /// Stored data could not be decoded
    #[error("stored {kind} data is corrupt: {reason}")]
    Corrupt { kind: &'static str, reason: String },
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_) | Self::RateLimited)
    }
}

/// The main error type for SplitIt operations
#[derive(Error, Debug)]
pub enum SplitError {
    /// Malformed input, rejected before any store I/O
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Store failure after retries were exhausted
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot failed structural or checksum verification
    #[error("Integrity check failed: {}", .0.join("; "))]
    Integrity(Vec<String>),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local file I/O errors (settings, snapshots, audit log)
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// The caller cancelled the operation between steps
    #[error("Operation cancelled")]
    Cancelled,
}

impl SplitError {
    /// Shorthand for a validation error with a single reason
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation(vec![reason.into()])
    }

    /// Create a "not found" error for groups
    pub fn group_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Group",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for expenses
    pub fn expense_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for snapshots
    pub fn snapshot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Snapshot",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an integrity error
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Whether re-running the whole operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }

    /// Structured list of reasons suitable for showing to a user
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Validation(reasons) | Self::Integrity(reasons) => reasons.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<std::io::Error> for SplitError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for SplitIt operations
pub type SplitResult<T> = Result<T, SplitError>;
