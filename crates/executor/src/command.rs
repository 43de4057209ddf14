//! Command enum defining all tally operations.
//!
//! Commands are the inbound half of the boundary. Every request the HTTP
//! layer can make of the ledger is represented as a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Can be converted to/from JSON for cross-language use
//! - **Raw**: Query parameters arrive as the client sent them and are validated
//!   by the engine, so a bad `limit` is a validation error rather than a
//!   deserialization failure

use serde::{Deserialize, Serialize};
use tally_core::TransactionRequest;

/// A command is a self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Commands | Description |
/// |----------|----------|-------------|
/// | Write | `CreateTransaction` | Idempotent create |
/// | Read | `GetTransaction`, `ListTransactions` | Lookup and paginated listing |
/// | Service | `Ping` | Liveness check |
///
/// # Example
///
/// ```ignore
/// use tally_executor::{Command, TransactionRequest};
///
/// let cmd = Command::CreateTransaction {
///     idempotency_key: Some("k123".into()),
///     request: TransactionRequest::new("A1", "A2", 10.0),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Liveness check.
    /// Returns: `Output::Pong`
    Ping,

    /// Create a transaction, optionally under an idempotency key.
    /// Returns: `Output::Created` or `Output::Replayed`
    CreateTransaction {
        /// Client-supplied key; `None` or empty disables deduplication
        #[serde(default)]
        idempotency_key: Option<String>,
        /// Payload
        request: TransactionRequest,
    },

    /// Fetch one transaction by id.
    /// Returns: `Output::Transaction`
    GetTransaction {
        /// Transaction id
        id: String,
    },

    /// List transactions in `(at, id)` order.
    /// Returns: `Output::TransactionPage`
    ListTransactions {
        /// Only transactions from this account
        #[serde(default)]
        from_account_id: Option<String>,
        /// Opaque token from a previous page
        #[serde(default)]
        cursor: Option<String>,
        /// Page size as sent by the client
        #[serde(default)]
        limit: Option<String>,
    },
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::CreateTransaction { .. } => "create_transaction",
            Command::GetTransaction { .. } => "get_transaction",
            Command::ListTransactions { .. } => "list_transactions",
        }
    }

    /// Whether this command may create records
    pub fn is_write(&self) -> bool {
        matches!(self, Command::CreateTransaction { .. })
    }
}
