//! Error types for the tally ledger
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Category | Variants | Recoverable |
//! |----------|----------|-------------|
//! | Validation | `Validation`, `InvalidCursor`, `CursorMismatch` | yes, reported before any lock |
//! | Idempotency | `IdempotencyConflict` | yes, no state mutated |
//! | Lookup | `NotFound` | yes |
//! | System | `Serialization`, `Config`, `Internal` | no, reported and never retried |

use thiserror::Error;

/// Result type alias for ledger operations
pub type TallyResult<T> = std::result::Result<T, TallyError>;

/// Error types for the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// Malformed, missing or out-of-range input
    #[error("validation failed: {reason}")]
    Validation {
        /// Human-readable description of the offending input
        reason: String,
    },

    /// Idempotency key reused with a different payload
    #[error("idempotency key reuse with different payload: {key}")]
    IdempotencyConflict {
        /// The reused key
        key: String,
    },

    /// No transaction with this id
    #[error("transaction not found: {id}")]
    NotFound {
        /// The id that was looked up
        id: String,
    },

    /// Pagination cursor could not be decoded
    #[error("invalid cursor: {reason}")]
    InvalidCursor {
        /// Which stage of decoding failed
        reason: String,
    },

    /// Pagination cursor was issued for a different filter
    #[error("cursor does not match query")]
    CursorMismatch,

    /// Serialization failure (fingerprint, body or cursor encoding)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read, parsed or validated
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        TallyError::Validation {
            reason: reason.into(),
        }
    }

    /// Create an idempotency conflict error
    pub fn conflict(key: impl Into<String>) -> Self {
        TallyError::IdempotencyConflict { key: key.into() }
    }

    /// Create a not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        TallyError::NotFound { id: id.into() }
    }

    /// Create an invalid-cursor error
    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        TallyError::InvalidCursor {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        TallyError::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        TallyError::Internal(message.into())
    }

    /// True for errors caused by caller input (cursor errors included)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TallyError::Validation { .. }
                | TallyError::InvalidCursor { .. }
                | TallyError::CursorMismatch
        )
    }

    /// True for idempotency key reuse
    pub fn is_conflict(&self) -> bool {
        matches!(self, TallyError::IdempotencyConflict { .. })
    }

    /// True for unknown ids
    pub fn is_not_found(&self) -> bool {
        matches!(self, TallyError::NotFound { .. })
    }
}
