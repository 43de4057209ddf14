//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: No error information is lost in conversion from [`TallyError`]

use serde::{Deserialize, Serialize};
use tally_core::TallyError;

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants | Status |
/// |----------|----------|--------|
/// | Validation | `InvalidInput`, `InvalidCursor`, `CursorMismatch` | 400 |
/// | Concurrency | `IdempotencyConflict` | 409 |
/// | Not Found | `TransactionNotFound` | 404 |
/// | System | `Serialization`, `Config`, `Internal` | 500 |
///
/// # Example
///
/// ```ignore
/// use tally_executor::{Command, Error, Executor};
///
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::IdempotencyConflict { key }) => {
///         println!("key '{}' was used for a different request", key);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Validation Errors ====================
    /// Invalid payload, id, or query parameter
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Cursor could not be decoded
    #[error("invalid cursor: {reason}")]
    InvalidCursor {
        /// Which decoding stage failed
        reason: String,
    },

    /// Cursor was issued for a different filter
    #[error("cursor does not match query")]
    CursorMismatch,

    // ==================== Concurrency Errors ====================
    /// Key reused with a different payload
    #[error("idempotency key reused with a different request: {key}")]
    IdempotencyConflict {
        /// The reused key
        key: String,
    },

    // ==================== Not Found ====================
    /// No transaction with this id
    #[error("transaction not found: {id}")]
    TransactionNotFound {
        /// The id that was looked up
        id: String,
    },

    // ==================== System Errors ====================
    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization {
        /// Encoder message
        reason: String,
    },

    /// Configuration error
    #[error("config error: {reason}")]
    Config {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal {
        /// Invariant that was violated
        reason: String,
    },
}

impl Error {
    /// HTTP status the boundary maps this error to
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput { .. } | Error::InvalidCursor { .. } | Error::CursorMismatch => 400,
            Error::IdempotencyConflict { .. } => 409,
            Error::TransactionNotFound { .. } => 404,
            Error::Serialization { .. } | Error::Config { .. } | Error::Internal { .. } => 500,
        }
    }

    /// True for 4xx errors
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<TallyError> for Error {
    fn from(err: TallyError) -> Self {
        match err {
            TallyError::Validation { reason } => Error::InvalidInput { reason },
            TallyError::IdempotencyConflict { key } => Error::IdempotencyConflict { key },
            TallyError::NotFound { id } => Error::TransactionNotFound { id },
            TallyError::InvalidCursor { reason } => Error::InvalidCursor { reason },
            TallyError::CursorMismatch => Error::CursorMismatch,
            TallyError::Serialization(reason) => Error::Serialization { reason },
            TallyError::Config(reason) => Error::Config { reason },
            TallyError::Internal(reason) => Error::Internal { reason },
        }
    }
}
