//! Resilient inter-service call layer
//!
//! This crate protects a service from the failures of the services it depends
//! on:
//! - Circuit breaker state machine (Closed → Open → HalfOpen → Closed) with
//!   bounded HalfOpen trials and monotonic (tokio) time
//! - Retry executor with exponential backoff, per-call timeouts and caller
//!   deadlines
//! - Fault translation of protocol, HTTP and transport failures into one
//!   canonical error taxonomy
//!
//! Nothing here knows about HTTP; transports live in `registrar-clients`.
//!
//! # Example
//!
//! ```rust
//! use registrar_breaker::{CallContext, CanonicalError, CircuitBreaker, RetryExecutor, RetryPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker = CircuitBreaker::builder("Courses Service")
//!     .failure_threshold(5)
//!     .reset_timeout(Duration::from_secs(60))
//!     .on_open(|name| eprintln!("{name} is unavailable"))
//!     .build();
//! let executor = RetryExecutor::new(RetryPolicy::default());
//!
//! let result = executor
//!     .execute(&breaker, &CallContext::traced("req-42"), |attempt| async move {
//!         Ok::<_, CanonicalError>(format!("fetched on attempt {}", attempt.index + 1))
//!     })
//!     .await;
//!
//! assert_eq!(result.unwrap(), "fetched on attempt 1");
//! assert!(breaker.is_closed());
//! # }
//! ```

pub mod builder;
pub mod callbacks;
pub mod circuit;
pub mod classify;
pub mod errors;
pub mod fault;
pub mod ledger;
pub mod retry;
pub mod trace;
pub mod trial;

pub use builder::CircuitBuilder;
pub use callbacks::{Callbacks, Transition};
pub use circuit::{BreakerSnapshot, CircuitBreaker, CircuitState, Config};
pub use classify::{DefaultClassifier, Disposition, PredicateClassifier, RetryClassifier};
pub use errors::CircuitError;
pub use fault::{CanonicalError, DownstreamFailure, ErrorCode, FaultTranslator, TransportErrorKind};
pub use retry::{Attempt, CallContext, RetryExecutor, RetryPolicy, backoff_delay};
pub use trace::{BearerToken, TraceId};
