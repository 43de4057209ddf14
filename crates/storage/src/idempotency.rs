//! Idempotency cache: key → (fingerprint, cached outcome, created_at)
//!
//! [`IdempotencyCache::resolve`] implements the replay protocol:
//!
//! ```text
//! key absent/empty   -> run supplier, do not touch the cache     => Created
//! key present:
//!   acquire key lock (blocks only same-key requests)
//!   entry with same fingerprint      -> cached outcome verbatim  => Replayed
//!   entry with other fingerprint     -> IdempotencyConflict
//!   no entry                         -> run supplier, store entry => Created
//!   release key lock (guard drop, every exit path)
//! ```
//!
//! Entries hold a copy of the outcome, never a reference into the record
//! store, so evicting an entry cannot invalidate a transaction.
//!
//! # TTL trade-off
//!
//! Entries older than the TTL are evicted by [`IdempotencyCache::evict_expired`].
//! After eviction the same key is a first attempt again: a retry creates a
//! new transaction instead of replaying the old one. A zero TTL disables
//! eviction.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::time::Duration;
use tally_core::{Fingerprint, TallyError, TallyResult, Timestamp, TransactionId};
use tracing::{debug, warn};

use crate::key_lock::KeyLockRegistry;

/// Externally visible result of a create, as first returned to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedOutcome {
    /// Id of the created transaction
    pub transaction_id: TransactionId,
    /// Resource locator, e.g. `/transactions/<id>`
    pub location: String,
    /// Serialized response body
    pub body: Vec<u8>,
}

/// Cached result for one idempotency key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyEntry {
    /// Digest of the request that produced `outcome`
    pub fingerprint: Fingerprint,
    /// Copy of the first outcome
    pub outcome: CachedOutcome,
    /// Insertion time; only used for TTL eviction
    pub created_at: Timestamp,
}

impl IdempotencyEntry {
    /// True if this entry is older than `ttl` at `now`
    ///
    /// Always false when `ttl` is zero.
    pub fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        now.duration_since(self.created_at)
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}

/// How a request was resolved against the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First attempt (or keyless): the supplier ran
    Created(CachedOutcome),
    /// Safe retry: the cached outcome is returned unchanged
    Replayed(CachedOutcome),
}

impl Resolution {
    /// Borrow the outcome
    pub fn outcome(&self) -> &CachedOutcome {
        match self {
            Resolution::Created(o) | Resolution::Replayed(o) => o,
        }
    }

    /// Take the outcome
    pub fn into_outcome(self) -> CachedOutcome {
        match self {
            Resolution::Created(o) | Resolution::Replayed(o) => o,
        }
    }

    /// True for a replay
    pub fn is_replay(&self) -> bool {
        matches!(self, Resolution::Replayed(_))
    }
}

/// Idempotency cache with per-key serialization
#[derive(Debug, Default)]
pub struct IdempotencyCache {
    entries: Mutex<FxHashMap<String, IdempotencyEntry>>,
    locks: KeyLockRegistry,
}

impl IdempotencyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a request identified by `key` and `fingerprint`
    ///
    /// `supplier` creates the transaction and its outcome. It runs at most once
    /// per key (until the entry is evicted) and runs while the key lock is held,
    /// so concurrent same-key requests observe the committed outcome.
    ///
    /// # Errors
    ///
    /// - `IdempotencyConflict` if the key is cached with a different fingerprint
    /// - whatever `supplier` returns; nothing is cached in that case
    pub fn resolve<F>(
        &self,
        key: Option<&str>,
        fingerprint: Fingerprint,
        supplier: F,
    ) -> TallyResult<Resolution>
    where
        F: FnOnce() -> TallyResult<CachedOutcome>,
    {
        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => return supplier().map(Resolution::Created),
        };

        let _guard = self.locks.acquire(key);

        if let Some(entry) = self.entries.lock().get(key) {
            if entry.fingerprint != fingerprint {
                warn!(target: "tally::idempotency", key, "Idempotency key reused with different payload");
                return Err(TallyError::conflict(key));
            }
            debug!(target: "tally::idempotency", key, id = %entry.outcome.transaction_id, "Replaying cached outcome");
            return Ok(Resolution::Replayed(entry.outcome.clone()));
        }

        let outcome = supplier()?;
        self.entries.lock().insert(
            key.to_string(),
            IdempotencyEntry {
                fingerprint,
                outcome: outcome.clone(),
                created_at: Timestamp::now(),
            },
        );
        Ok(Resolution::Created(outcome))
    }

    /// Copy of the entry for `key`, if cached
    pub fn get(&self, key: &str) -> Option<IdempotencyEntry> {
        self.entries.lock().get(key).cloned()
    }

    /// Remove every entry older than `ttl` at `now`
    ///
    /// Takes the same lock as lookups and inserts. Returns the number of
    /// evicted entries. A zero `ttl` evicts nothing.
    pub fn evict_expired(&self, now: Timestamp, ttl: Duration) -> usize {
        if ttl.is_zero() {
            return 0;
        }
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - entries.len()
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of keys with a request currently inside or queued on the critical section
    pub fn in_flight_keys(&self) -> usize {
        self.locks.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint::from_bytes([byte; 32])
    }

    fn outcome() -> CachedOutcome {
        let id = TransactionId::new();
        CachedOutcome {
            location: format!("/transactions/{}", id),
            body: format!("{{\"id\":\"{}\"}}", id).into_bytes(),
            transaction_id: id,
        }
    }

    #[test]
    fn test_keyless_always_runs_supplier() {
        let cache = IdempotencyCache::new();
        let calls = AtomicUsize::new(0);

        for key in [None, Some("")] {
            let res = cache
                .resolve(key, fp(1), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(outcome())
                })
                .unwrap();
            assert!(!res.is_replay());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_same_fingerprint_replays_verbatim() {
        let cache = IdempotencyCache::new();
        let first = cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();
        let second = cache
            .resolve(Some("k"), fp(1), || panic!("supplier must not run on replay"))
            .unwrap();

        assert!(!first.is_replay());
        assert!(second.is_replay());
        assert_eq!(first.outcome(), second.outcome());
    }

    #[test]
    fn test_different_fingerprint_conflicts() {
        let cache = IdempotencyCache::new();
        cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();

        let err = cache
            .resolve(Some("k"), fp(2), || panic!("supplier must not run on conflict"))
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.in_flight_keys(), 0);
    }

    #[test]
    fn test_supplier_error_caches_nothing_and_releases_lock() {
        let cache = IdempotencyCache::new();
        let err = cache
            .resolve(Some("k"), fp(1), || Err(TallyError::internal("encode failed")))
            .unwrap_err();

        assert!(matches!(err, TallyError::Internal(_)));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.in_flight_keys(), 0);

        // The key is still usable as a first attempt
        let res = cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();
        assert!(!res.is_replay());
    }

    #[test]
    fn test_concurrent_same_key_runs_supplier_once() {
        let cache = Arc::new(IdempotencyCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .resolve(Some("shared"), fp(7), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(outcome())
                        })
                        .unwrap()
                        .into_outcome()
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.in_flight_keys(), 0);
    }

    #[test]
    fn test_evict_expired_respects_ttl() {
        let cache = IdempotencyCache::new();
        cache.resolve(Some("old"), fp(1), || Ok(outcome())).unwrap();

        let created = cache.get("old").unwrap().created_at;
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.evict_expired(created.saturating_add(ttl), ttl), 0);
        assert_eq!(
            cache.evict_expired(created.saturating_add(ttl + Duration::from_micros(1)), ttl),
            1
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_evicts() {
        let cache = IdempotencyCache::new();
        cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();
        assert_eq!(cache.evict_expired(Timestamp::MAX, Duration::ZERO), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicted_key_is_first_attempt_again() {
        let cache = IdempotencyCache::new();
        let first = cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();
        cache.evict_expired(Timestamp::MAX, Duration::from_secs(1));

        let second = cache.resolve(Some("k"), fp(1), || Ok(outcome())).unwrap();
        assert!(!second.is_replay());
        assert_ne!(
            first.outcome().transaction_id,
            second.outcome().transaction_id
        );
    }
}
