//! Idempotency TTL sweeper background task
//!
//! Runs in a background thread and periodically evicts idempotency entries
//! older than the configured TTL.
//!
//! # Design Notes
//!
//! - Eviction goes through `IdempotencyCache::evict_expired`, which takes the
//!   same lock as cache lookups and inserts
//! - Never touches the record store
//! - Shutdown is a flag plus condvar: `shutdown()` wakes the thread
//!   immediately and no tick starts after it has been observed
//! - Sleeps first (no sweep immediately on start)

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tally_core::Timestamp;
use tracing::{debug, info};

use crate::idempotency::IdempotencyCache;

/// Cancellation token shared between the sweeper and its owner
#[derive(Debug, Default)]
struct ShutdownSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl ShutdownSignal {
    fn trigger(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        self.wake.notify_all();
    }

    fn is_triggered(&self) -> bool {
        *self.stopped.lock()
    }

    /// Wait up to `timeout`. Returns true if shutdown was signaled.
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Background idempotency TTL sweeper
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tally_storage::{IdempotencyCache, IdempotencySweeper};
///
/// let cache = Arc::new(IdempotencyCache::new());
/// let sweeper = IdempotencySweeper::new(
///     Arc::clone(&cache),
///     Duration::from_secs(24 * 3600),
///     Duration::from_secs(300),
/// );
/// let handle = sweeper.start();
///
/// // ... serve requests ...
///
/// sweeper.shutdown();
/// handle.join().unwrap();
/// ```
#[derive(Debug)]
pub struct IdempotencySweeper {
    cache: Arc<IdempotencyCache>,
    ttl: Duration,
    interval: Duration,
    signal: Arc<ShutdownSignal>,
}

impl IdempotencySweeper {
    /// Create a sweeper
    ///
    /// # Arguments
    ///
    /// * `cache` - The cache to sweep
    /// * `ttl` - Maximum entry age; zero means entries never expire
    /// * `interval` - Time between sweeps
    pub fn new(cache: Arc<IdempotencyCache>, ttl: Duration, interval: Duration) -> Self {
        Self {
            cache,
            ttl,
            interval,
            signal: Arc::new(ShutdownSignal::default()),
        }
    }

    /// Start the background thread
    ///
    /// The thread runs until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let signal = Arc::clone(&self.signal);
        let ttl = self.ttl;
        let interval = self.interval;

        info!(target: "tally::sweeper", ttl_ms = ttl.as_millis() as u64, interval_ms = interval.as_millis() as u64, "Idempotency sweeper started");

        thread::spawn(move || {
            while !signal.wait(interval) {
                let evicted = cache.evict_expired(Timestamp::now(), ttl);
                if evicted > 0 {
                    debug!(target: "tally::sweeper", evicted, remaining = cache.len(), "Evicted expired idempotency entries");
                }
            }
            info!(target: "tally::sweeper", "Idempotency sweeper stopped");
        })
    }

    /// Run one eviction pass on the calling thread
    pub fn sweep_now(&self) -> usize {
        self.cache.evict_expired(Timestamp::now(), self.ttl)
    }

    /// Signal shutdown
    ///
    /// The background thread wakes immediately and exits without another sweep.
    pub fn shutdown(&self) {
        self.signal.trigger();
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.signal.is_triggered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idempotency::CachedOutcome;
    use tally_core::{Fingerprint, TransactionId};

    fn seed(cache: &IdempotencyCache, key: &str) {
        cache
            .resolve(Some(key), Fingerprint::from_bytes([1; 32]), || {
                Ok(CachedOutcome {
                    transaction_id: TransactionId::new(),
                    location: "/transactions/x".to_string(),
                    body: b"{}".to_vec(),
                })
            })
            .unwrap();
    }

    #[test]
    fn test_sweeper_creation() {
        let cache = Arc::new(IdempotencyCache::new());
        let sweeper =
            IdempotencySweeper::new(cache, Duration::from_secs(60), Duration::from_secs(60));
        assert!(!sweeper.is_shutdown());
        sweeper.shutdown();
        assert!(sweeper.is_shutdown());
    }

    #[test]
    fn test_sweeper_evicts_expired() {
        let cache = Arc::new(IdempotencyCache::new());
        seed(&cache, "temp");

        let sweeper = IdempotencySweeper::new(
            Arc::clone(&cache),
            Duration::from_millis(50),
            Duration::from_millis(20),
        );
        let handle = sweeper.start();

        thread::sleep(Duration::from_millis(300));
        assert!(cache.get("temp").is_none());

        sweeper.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_sweeper_keeps_fresh_entries() {
        let cache = Arc::new(IdempotencyCache::new());
        seed(&cache, "fresh");

        let sweeper = IdempotencySweeper::new(
            Arc::clone(&cache),
            Duration::from_secs(60),
            Duration::from_millis(10),
        );
        let handle = sweeper.start();

        thread::sleep(Duration::from_millis(100));
        assert!(cache.get("fresh").is_some());

        sweeper.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_sweep_now() {
        let cache = Arc::new(IdempotencyCache::new());
        seed(&cache, "a");
        seed(&cache, "b");

        let sweeper =
            IdempotencySweeper::new(Arc::clone(&cache), Duration::from_millis(1), Duration::from_secs(60));
        thread::sleep(Duration::from_millis(10));

        assert_eq!(sweeper.sweep_now(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweeper_graceful_shutdown() {
        let cache = Arc::new(IdempotencyCache::new());
        let sweeper =
            IdempotencySweeper::new(cache, Duration::from_secs(1), Duration::from_secs(10));
        let handle = sweeper.start();

        sweeper.shutdown();

        let start = Instant::now();
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1), "Should shutdown quickly");
    }

    #[test]
    fn test_no_ticks_after_shutdown() {
        let cache = Arc::new(IdempotencyCache::new());
        let sweeper = IdempotencySweeper::new(
            Arc::clone(&cache),
            Duration::from_millis(1),
            Duration::from_millis(5),
        );
        let handle = sweeper.start();
        sweeper.shutdown();
        handle.join().unwrap();

        seed(&cache, "late");
        thread::sleep(Duration::from_millis(50));
        assert!(cache.get("late").is_some());
    }
}
