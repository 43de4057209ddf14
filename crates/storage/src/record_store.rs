//! RecordStore: authoritative map of created transactions
//!
//! - `FxHashMap<TransactionId, Transaction>` for O(1) lookups
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Insert-only**: records are never deleted or overwritten
//! - **Snapshots are copies**: `snapshot()` clones matching records under the
//!   read lock, so callers never observe a partial write and never hold the
//!   lock while sorting or paginating

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use tally_core::{Transaction, TransactionId};

/// In-memory transaction store
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<FxHashMap<TransactionId, Transaction>>,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly created transaction under its id
    ///
    /// # Panics
    ///
    /// If a record with the same id already exists. Ids come from 128 random
    /// bits, so a collision is a fatal invariant violation.
    pub fn create(&self, txn: Transaction) {
        let mut records = self.records.write();
        match records.entry(txn.id.clone()) {
            Entry::Occupied(existing) => {
                panic!("transaction id collision: {}", existing.key())
            }
            Entry::Vacant(slot) => {
                slot.insert(txn);
            }
        }
    }

    /// Look up a transaction by id
    pub fn get(&self, id: &TransactionId) -> Option<Transaction> {
        self.records.read().get(id).cloned()
    }

    /// Check whether a transaction exists
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.records.read().contains_key(id)
    }

    /// Point-in-time copy of every transaction matching `predicate`
    ///
    /// Order is unspecified.
    pub fn snapshot<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        let records = self.records.read();
        records.values().filter(|t| predicate(t)).cloned().collect()
    }

    /// Number of stored transactions
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if no transaction has been stored
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tally_core::TransactionRequest;

    fn txn(from: &str, to: &str) -> Transaction {
        Transaction::from_request(&TransactionRequest::new(from, to, 10.0))
    }

    #[test]
    fn test_create_and_get() {
        let store = RecordStore::new();
        let t = txn("A1", "A2");
        let id = t.id.clone();

        store.create(t.clone());

        assert_eq!(store.get(&id), Some(t));
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_unknown_returns_none() {
        let store = RecordStore::new();
        assert!(store.get(&TransactionId::from_string("missing")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_applies_predicate() {
        let store = RecordStore::new();
        store.create(txn("A1", "B"));
        store.create(txn("A1", "C"));
        store.create(txn("A2", "C"));

        let from_a1 = store.snapshot(|t| t.from_account_id == "A1");
        assert_eq!(from_a1.len(), 2);
        assert!(from_a1.iter().all(|t| t.from_account_id == "A1"));

        assert_eq!(store.snapshot(|_| true).len(), 3);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_writes() {
        let store = RecordStore::new();
        store.create(txn("A1", "B"));

        let snap = store.snapshot(|_| true);
        store.create(txn("A1", "C"));

        assert_eq!(snap.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_creates() {
        let store = Arc::new(RecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.create(txn("A1", "A2"));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 800);
    }

    #[test]
    #[should_panic(expected = "transaction id collision")]
    fn test_duplicate_id_is_fatal() {
        let store = RecordStore::new();
        let txn = Transaction::from_request(&TransactionRequest::new("A1", "A2", 1.0));
        store.create(txn.clone());
        store.create(txn);
    }
}
