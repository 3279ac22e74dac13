//! Trial gate for the HalfOpen state
//!
//! While a circuit is HalfOpen only a bounded number of trial calls may be in
//! flight at once. Callers beyond the limit are rejected immediately instead
//! of queueing behind the trial.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free permit counter bounding concurrent HalfOpen trial calls
#[derive(Debug)]
pub struct TrialGate {
    /// Maximum number of concurrent trials
    limit: usize,
    /// Trials currently in flight
    in_flight: AtomicUsize,
}

impl TrialGate {
    /// Create a gate admitting at most `limit` concurrent trials (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Try to take a trial slot without blocking
    ///
    /// Returns `None` when every slot is taken.
    pub fn try_acquire(self: &Arc<Self>) -> Option<TrialPermit> {
        let mut current = self.in_flight.load(Ordering::Acquire);

        loop {
            if current >= self.limit {
                return None;
            }

            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(TrialPermit {
                        gate: Arc::clone(self),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::Release);
    }
}

/// Slot held by a trial call; released on drop, including when the call's
/// future is cancelled mid-flight
#[derive(Debug)]
pub struct TrialPermit {
    gate: Arc<TrialGate>,
}

impl Drop for TrialPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
