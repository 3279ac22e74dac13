//! Outcome bookkeeping shared between a breaker and its state machine guards
//!
//! The ledger keeps the consecutive failure count and the time of the most
//! recent failure. Writes only happen while the owning breaker holds its state
//! lock; the atomics exist so that guards (which only see a cloned context)
//! and observability reads can look at the numbers without that lock.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Sentinel for "no failure recorded since creation or last clear".
const NO_FAILURE: u64 = 0;

/// Consecutive-failure ledger for a single circuit
#[derive(Debug)]
pub struct Ledger {
    /// Consecutive failures since the last success while Closed (or last close)
    failures: AtomicUsize,
    /// Microseconds since `epoch` of the last failure, offset by one (0 = none)
    last_failure_us: AtomicU64,
    /// Monotonic anchor, immune to wall-clock adjustments
    epoch: Instant,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            failures: AtomicUsize::new(0),
            last_failure_us: AtomicU64::new(NO_FAILURE),
            epoch: Instant::now(),
        }
    }

    /// Count a failure and stamp it as the most recent one
    pub fn record_failure(&self) -> usize {
        let stamp = self.now_us().saturating_add(1);
        self.last_failure_us.store(stamp, Ordering::Release);
        self.failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Forget consecutive failures (success while Closed, or entering Closed)
    ///
    /// The last failure timestamp is kept; only a manual reset clears it.
    pub fn reset_failures(&self) {
        self.failures.store(0, Ordering::Release);
    }

    /// Clear everything, including the last failure timestamp
    pub fn clear(&self) {
        self.failures.store(0, Ordering::Release);
        self.last_failure_us.store(NO_FAILURE, Ordering::Release);
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }

    /// Time elapsed since the last recorded failure, if any
    pub fn last_failure_age(&self) -> Option<Duration> {
        match self.last_failure_us.load(Ordering::Acquire) {
            NO_FAILURE => None,
            stamp => {
                let at = Duration::from_micros(stamp - 1);
                Some(self.epoch.elapsed().saturating_sub(at))
            }
        }
    }

    /// Seconds since the ledger was created
    pub fn monotonic_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn now_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX - 1)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
