//! tally - in-memory transaction ledger with idempotent request handling
//!
//! Clients may attach an idempotency key to a create request. Retrying the
//! same request under the same key returns the original outcome instead of
//! creating a duplicate; reusing the key for a different request is a
//! conflict. Listing is keyset-paginated with opaque cursors.
//!
//! # Quick Start
//!
//! ```ignore
//! use tally::{Command, Executor, TransactionRequest};
//!
//! let executor = Executor::open_default()?;
//!
//! let response = executor.handle(Command::CreateTransaction {
//!     idempotency_key: Some("k123".into()),
//!     request: TransactionRequest::new("A1", "A2", 10.0),
//! });
//! assert_eq!(response.status, 202);
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`], which dispatches [`Command`]s to
//! a shared [`Ledger`]. Storage internals (record store, key locks,
//! idempotency cache, sweeper) are not exposed.

// Re-export the public API from tally-executor
pub use tally_executor::*;
