//! Per-key mutual exclusion for idempotency keys
//!
//! `KeyLockRegistry::acquire(key)` blocks until the caller is the only holder
//! of `key`, and returns a [`KeyLockGuard`] that releases on drop. Requests
//! with different keys never wait on each other.
//!
//! # Lifecycle
//!
//! ```text
//! acquire(k):  registry lock { slot(k).refs += 1 }   -- short
//!              slot(k).lock()                         -- may block, registry NOT held
//! drop(guard): slot(k).unlock()
//!              registry lock { refs -= 1; remove slot if refs == 0 }
//! ```
//!
//! A slot exists while at least one request references it, so the registry
//! holds at most one entry per in-flight key, never one per historical key.
//! The reference count keeps a slot alive while requests are still queued on it.

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Exclusion primitive for one key: a held flag plus a condvar
#[derive(Debug, Default)]
struct KeyLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl KeyLock {
    fn lock(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    fn unlock(&self) {
        let mut held = self.held.lock();
        *held = false;
        self.released.notify_one();
    }
}

#[derive(Debug)]
struct Slot {
    lock: Arc<KeyLock>,
    refs: usize,
}

/// Registry of reference-counted per-key locks
#[derive(Debug, Default)]
pub struct KeyLockRegistry {
    slots: Mutex<FxHashMap<String, Slot>>,
}

impl KeyLockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is exclusively held by the caller
    ///
    /// Never fails. The registry map is only locked for the lookup and the
    /// refcount increment; waiting happens on the key's own lock.
    pub fn acquire(&self, key: &str) -> KeyLockGuard<'_> {
        let lock = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
                lock: Arc::new(KeyLock::default()),
                refs: 0,
            });
            slot.refs += 1;
            Arc::clone(&slot.lock)
        };

        lock.lock();

        KeyLockGuard {
            registry: self,
            key: key.to_string(),
            lock,
        }
    }

    /// Number of keys currently held or waited on
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }

    fn release(&self, key: &str) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            slot.refs -= 1;
            if slot.refs == 0 {
                slots.remove(key);
            }
        }
    }
}

/// RAII handle for a held key
///
/// Dropping it releases the key's lock, then decrements the slot's refcount.
/// This runs on every exit path, including `?` returns and panics.
#[derive(Debug)]
pub struct KeyLockGuard<'a> {
    registry: &'a KeyLockRegistry,
    key: String,
    lock: Arc<KeyLock>,
}

impl KeyLockGuard<'_> {
    /// The key this guard holds
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
        self.registry.release(&self.key);
    }
}
