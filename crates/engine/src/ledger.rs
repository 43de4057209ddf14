//! Ledger: the transaction service
//!
//! Wires the storage components together:
//!
//! ```text
//! create_transaction(key, request)
//!   validate_request          -- fails before any lock
//!   fingerprint               -- fails before any lock
//!   IdempotencyCache::resolve(key, fp, || commit(request))
//!       commit: build Transaction, encode body, RecordStore::create
//!
//! list_transactions(filter, cursor, limit)
//!   parse_limit, PageCursor::decode, check_filter
//!   RecordStore::snapshot(filter) -> paginate
//! ```
//!
//! The ledger owns the idempotency sweeper: it is started in
//! [`Ledger::open`] (unless the TTL is zero) and stopped on
//! [`Ledger::shutdown`] or drop.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tally_core::{
    TallyError, TallyResult, Transaction, TransactionFilter, TransactionId, TransactionRequest,
};
use tally_storage::{CachedOutcome, IdempotencyCache, IdempotencySweeper, RecordStore, Resolution};
use tracing::{debug, info, warn};

use crate::config::TallyConfig;
use crate::cursor::PageCursor;
use crate::fingerprint::fingerprint;
use crate::pagination::{paginate, parse_limit, Page};
use crate::validation::validate_request;

/// Path prefix for transaction locators
pub const LOCATION_PREFIX: &str = "/transactions/";

/// Build the resource locator for a transaction id
pub fn location_for(id: &TransactionId) -> String {
    format!("{}{}", LOCATION_PREFIX, id)
}

/// How a create request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// A new transaction was stored
    Created,
    /// A previous outcome for the same key and payload was returned
    Replayed,
}

/// Result of a create request
///
/// For a replay, `location` and `body` are byte-identical to the first response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Created or replayed
    pub status: WriteStatus,
    /// Id of the transaction
    pub transaction_id: TransactionId,
    /// `/transactions/<id>`
    pub location: String,
    /// JSON-encoded transaction
    pub body: Vec<u8>,
}

impl From<Resolution> for WriteOutcome {
    fn from(resolution: Resolution) -> Self {
        let status = if resolution.is_replay() {
            WriteStatus::Replayed
        } else {
            WriteStatus::Created
        };
        let CachedOutcome {
            transaction_id,
            location,
            body,
        } = resolution.into_outcome();
        WriteOutcome {
            status,
            transaction_id,
            location,
            body,
        }
    }
}

/// In-memory transaction ledger with idempotent creates
///
/// `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct Ledger {
    config: TallyConfig,
    records: RecordStore,
    idempotency: Arc<IdempotencyCache>,
    sweeper: Option<IdempotencySweeper>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ledger {
    /// Open a ledger with the given configuration
    ///
    /// # Errors
    ///
    /// `Config` if the configuration fails validation.
    pub fn open(config: TallyConfig) -> TallyResult<Self> {
        config.validate()?;

        let idempotency = Arc::new(IdempotencyCache::new());
        let (sweeper, handle) = if config.eviction_enabled() {
            let sweeper = IdempotencySweeper::new(
                Arc::clone(&idempotency),
                config.idempotency_ttl(),
                config.sweep_interval(),
            );
            let handle = sweeper.start();
            (Some(sweeper), Some(handle))
        } else {
            (None, None)
        };

        info!(
            target: "tally::ledger",
            ttl_ms = config.idempotency_ttl_ms,
            max_page_limit = config.max_page_limit,
            "Ledger opened"
        );

        Ok(Ledger {
            config,
            records: RecordStore::new(),
            idempotency,
            sweeper,
            sweeper_handle: Mutex::new(handle),
        })
    }

    /// Open a ledger with default configuration
    pub fn with_defaults() -> TallyResult<Self> {
        Self::open(TallyConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Create a transaction, honoring an optional idempotency key
    ///
    /// - no key (or empty key): always creates a new transaction
    /// - new key: creates and caches the outcome
    /// - known key, same payload: returns the cached outcome unchanged
    /// - known key, different payload: `IdempotencyConflict`
    ///
    /// # Errors
    ///
    /// `Validation` before anything is locked; `IdempotencyConflict`;
    /// `Serialization` if the fingerprint or body cannot be encoded.
    pub fn create_transaction(
        &self,
        idempotency_key: Option<&str>,
        request: &TransactionRequest,
    ) -> TallyResult<WriteOutcome> {
        let request = validate_request(request)?;
        let fp = fingerprint(&request)?;

        let resolution = self
            .idempotency
            .resolve(idempotency_key, fp, || self.commit(&request))?;

        let outcome = WriteOutcome::from(resolution);
        debug!(
            target: "tally::ledger",
            id = %outcome.transaction_id,
            replayed = outcome.status == WriteStatus::Replayed,
            "Create resolved"
        );
        Ok(outcome)
    }

    /// Store a new transaction and build its outcome
    ///
    /// The body is encoded before the insert, so an encode failure stores nothing.
    fn commit(&self, request: &TransactionRequest) -> TallyResult<CachedOutcome> {
        let txn = Transaction::from_request(request);
        let body = serde_json::to_vec(&txn).map_err(|e| TallyError::Serialization(e.to_string()))?;
        let outcome = CachedOutcome {
            transaction_id: txn.id.clone(),
            location: location_for(&txn.id),
            body,
        };
        self.records.create(txn);
        Ok(outcome)
    }

    /// Look up a transaction by id
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `NotFound` for an unknown one.
    pub fn get_transaction(&self, id: &str) -> TallyResult<Transaction> {
        let id = id.trim();
        if id.is_empty() {
            return Err(TallyError::validation("missing id"));
        }
        self.records
            .get(&TransactionId::from_string(id))
            .ok_or_else(|| TallyError::not_found(id))
    }

    /// List transactions matching `filter`, one page at a time
    ///
    /// `cursor` is the `next_cursor` of the previous page (or `None` to start);
    /// `limit` is the raw requested page size.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad limit, `InvalidCursor` for an undecodable cursor,
    /// `CursorMismatch` for a cursor issued under another filter.
    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        cursor: Option<&str>,
        limit: Option<&str>,
    ) -> TallyResult<Page> {
        let limit = parse_limit(
            limit,
            self.config.default_page_limit,
            self.config.max_page_limit,
        )?;
        let cursor = PageCursor::decode(cursor)?;
        if let Some(c) = &cursor {
            c.check_filter(filter)?;
        }

        let snapshot = self.records.snapshot(|t| filter.matches(t));
        paginate(snapshot, filter, cursor.as_ref(), limit)
    }

    /// Run one idempotency eviction pass now
    ///
    /// Returns the number of evicted entries; always 0 when the TTL is zero.
    pub fn sweep_expired(&self) -> usize {
        self.sweeper.as_ref().map_or(0, |s| s.sweep_now())
    }

    /// Number of stored transactions
    pub fn transaction_count(&self) -> usize {
        self.records.len()
    }

    /// Number of cached idempotency keys
    pub fn idempotency_entry_count(&self) -> usize {
        self.idempotency.len()
    }

    /// Number of idempotency keys with requests currently in flight
    pub fn in_flight_key_count(&self) -> usize {
        self.idempotency.in_flight_keys()
    }

    /// Stop the sweeper and wait for it to exit
    ///
    /// Idempotent. Requests keep working afterwards; entries just stop expiring.
    pub fn shutdown(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.shutdown();
        }
        if let Some(handle) = self.sweeper_handle.lock().take() {
            join_sweeper(handle);
            info!(target: "tally::ledger", "Ledger shut down");
        }
    }
}

/// Wait for the sweeper thread. Returns false if it panicked.
fn join_sweeper(handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(target: "tally::ledger", panic = %message, "Idempotency sweeper thread panicked");
            false
        }
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
