//! Error types for circuit breaker operations

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`CircuitBreaker::call`](crate::CircuitBreaker::call)
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// Circuit is open, the operation was not invoked
    #[error("circuit '{circuit}' is open (retry in {retry_after:?})")]
    Open {
        circuit: String,
        retry_after: Duration,
    },
    /// Circuit is half-open and its trial slots are taken
    #[error("circuit '{circuit}' is half-open and a trial call is already in flight")]
    TrialInFlight { circuit: String },
    /// The wrapped operation failed
    #[error("{0}")]
    Execution(E),
}

impl<E> CircuitError<E> {
    /// True when the breaker refused admission without invoking the operation
    pub fn is_rejection(&self) -> bool {
        !matches!(self, CircuitError::Execution(_))
    }

    /// The operation's own error, if it ran
    pub fn into_execution(self) -> Option<E> {
        match self {
            CircuitError::Execution(e) => Some(e),
            _ => None,
        }
    }
}
