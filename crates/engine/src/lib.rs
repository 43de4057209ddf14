//! Ledger engine for tally
//!
//! This crate orchestrates the storage layer:
//! - Ledger: idempotent creates, lookups, and paginated listing
//! - Request validation and fingerprinting
//! - Opaque cursors and keyset pagination
//! - Configuration via `tally.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod fingerprint;
pub mod ledger;
pub mod pagination;
pub mod validation;

pub use config::{TallyConfig, CONFIG_FILE_NAME};
pub use cursor::PageCursor;
pub use fingerprint::fingerprint;
pub use ledger::{location_for, Ledger, WriteOutcome, WriteStatus, LOCATION_PREFIX};
pub use pagination::{paginate, parse_limit, Page};
pub use validation::validate_request;
