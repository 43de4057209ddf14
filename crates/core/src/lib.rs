//! Core types for Tally
//!
//! This crate defines the foundational types used throughout the system:
//! - Timestamp: microsecond-precision creation times
//! - TransactionId, Transaction, TransactionStatus: the stored records
//! - TransactionRequest: inbound create payload
//! - TransactionFilter: list predicate
//! - Fingerprint: digest of a canonical request payload
//! - TallyError: error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod timestamp;
pub mod types;

pub use error::{TallyError, TallyResult};
pub use timestamp::Timestamp;
pub use types::{
    Fingerprint, Transaction, TransactionFilter, TransactionId, TransactionRequest,
    TransactionStatus,
};
