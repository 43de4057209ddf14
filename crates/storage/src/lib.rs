//! Storage layer for tally
//!
//! This crate implements the concurrent in-memory structures:
//! - RecordStore: insert-only transaction map behind an RwLock
//! - KeyLockRegistry: reference-counted per-key mutual exclusion
//! - IdempotencyCache: replay/conflict detection keyed by idempotency key
//! - IdempotencySweeper: background TTL eviction for the cache
//!
//! Each map is guarded independently. The only blocking point is waiting on
//! a key lock, and the registry's own map is never held while waiting.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod idempotency;
pub mod key_lock;
pub mod record_store;
pub mod sweeper;

pub use idempotency::{CachedOutcome, IdempotencyCache, IdempotencyEntry, Resolution};
pub use key_lock::{KeyLockGuard, KeyLockRegistry};
pub use record_store::RecordStore;
pub use sweeper::IdempotencySweeper;
