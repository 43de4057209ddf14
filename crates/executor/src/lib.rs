//! # Tally Executor
//!
//! The public API for tally - an in-memory transaction ledger with
//! idempotent creates and cursor pagination.
//!
//! This is the only crate users need to import. It provides:
//! - [`Executor`] - dispatches [`Command`]s to the ledger
//! - [`Command`]/[`Output`]/[`Error`] - the serializable command interface
//! - [`Response`] - status, `Location` and body for the HTTP layer
//!
//! ## Quick Start
//!
//! ```text
//! use tally_executor::{Command, Executor, TransactionRequest};
//!
//! let executor = Executor::open_default()?;
//!
//! let cmd = Command::CreateTransaction {
//!     idempotency_key: Some("k123".into()),
//!     request: TransactionRequest::new("A1", "A2", 10.0),
//! };
//!
//! let first = executor.handle(cmd.clone());   // 202, Location: /transactions/<id>
//! let replay = executor.handle(cmd);          // 202, same Location, same body
//! assert_eq!(first, replay);
//! ```
//!
//! ## Status Mapping
//!
//! | Result | Status |
//! |--------|--------|
//! | Created / Replayed | 202 |
//! | Get / List | 200 |
//! | Validation, bad cursor, bad limit | 400 |
//! | Unknown transaction | 404 |
//! | Idempotency key reused with another payload | 409 |

#![warn(missing_docs)]

mod command;
mod error;
mod executor;
mod output;
mod response;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::{Output, WriteResult};
pub use response::{Response, STATUS_ACCEPTED, STATUS_OK};

// Domain types used in commands and outputs
pub use tally_core::{
    Timestamp, Transaction, TransactionFilter, TransactionId, TransactionRequest,
    TransactionStatus,
};
pub use tally_engine::{Ledger, Page, TallyConfig};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
