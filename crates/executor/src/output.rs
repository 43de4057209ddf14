//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. A create produces either
//! `Created` or `Replayed`; both carry the same fields so the boundary can
//! render them identically.

use serde::{Deserialize, Serialize};
use tally_core::Transaction;
use tally_engine::{Page, WriteOutcome, WriteStatus};

/// The stored outcome of a create, as returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    /// Id of the created transaction
    pub transaction_id: String,
    /// `/transactions/<id>`
    pub location: String,
    /// JSON-encoded transaction, byte-identical across replays
    pub body: Vec<u8>,
}

/// Successful command execution results.
///
/// | Command | Output |
/// |---------|--------|
/// | `Ping` | `Pong` |
/// | `CreateTransaction` | `Created` / `Replayed` |
/// | `GetTransaction` | `Transaction` |
/// | `ListTransactions` | `TransactionPage` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Service version
    Pong {
        /// Crate version
        version: String,
    },

    /// A new transaction was stored
    Created(WriteResult),

    /// The cached outcome of an earlier identical request
    Replayed(WriteResult),

    /// A single transaction
    Transaction(Transaction),

    /// One page of a listing
    TransactionPage(Page),
}

impl Output {
    /// The create result, if this is a create output
    pub fn write_result(&self) -> Option<&WriteResult> {
        match self {
            Output::Created(result) | Output::Replayed(result) => Some(result),
            _ => None,
        }
    }

    /// True for `Replayed`
    pub fn is_replay(&self) -> bool {
        matches!(self, Output::Replayed(_))
    }
}

impl From<WriteOutcome> for Output {
    fn from(outcome: WriteOutcome) -> Self {
        let result = WriteResult {
            transaction_id: outcome.transaction_id.as_str().to_string(),
            location: outcome.location,
            body: outcome.body,
        };
        match outcome.status {
            WriteStatus::Created => Output::Created(result),
            WriteStatus::Replayed => Output::Replayed(result),
        }
    }
}
