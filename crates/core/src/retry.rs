//! Resilient call executor: bounded retries with exponential backoff
//!
//! Every attempt goes through the dependency's [`CircuitBreaker`]. A failed
//! attempt is classified; terminal errors surface at once, retryable ones are
//! retried after `base_delay * 2^attempt` until the attempts run out. The
//! whole sequence can be bounded by a caller deadline, which aborts both an
//! in-flight attempt and a pending backoff sleep.

use crate::{
    circuit::CircuitBreaker,
    classify::{DefaultClassifier, Disposition, RetryClassifier},
    errors::CircuitError,
    fault::CanonicalError,
    trace::{BearerToken, TraceId, trace_label},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Retry policy for one dependency
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound on a single attempt; expiry counts as a retryable failure
    pub per_call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            per_call_timeout: None,
        }
    }
}

/// Delay before the attempt following failed attempt `attempt` (0-based)
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Per-invocation context supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    trace_id: Option<TraceId>,
    bearer_token: Option<BearerToken>,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traced(trace_id: impl Into<TraceId>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
            ..Self::default()
        }
    }

    pub fn with_trace(mut self, trace_id: Option<TraceId>) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Credential forwarded on every attempt
    pub fn with_bearer_token(mut self, token: impl Into<BearerToken>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn bearer_token(&self) -> Option<&BearerToken> {
        self.bearer_token.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Handed to the operation on every attempt
#[derive(Debug, Clone)]
pub struct Attempt {
    /// 0-based attempt index
    pub index: u32,
    pub trace_id: Option<TraceId>,
    pub bearer_token: Option<BearerToken>,
}

/// Runs breaker-protected operations under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    classifier: Arc<dyn RetryClassifier>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_classifier(policy, Arc::new(DefaultClassifier))
    }

    pub fn with_classifier(policy: RetryPolicy, classifier: Arc<dyn RetryClassifier>) -> Self {
        Self { policy, classifier }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `op` through `breaker`, retrying retryable failures
    ///
    /// `op` is invoked once per admitted attempt. A rejection by the breaker
    /// is surfaced immediately as `SVC_CIRCUIT_OPEN` and never retried.
    pub async fn execute<F, Fut, T>(
        &self,
        breaker: &CircuitBreaker,
        ctx: &CallContext,
        op: F,
    ) -> Result<T, CanonicalError>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, CanonicalError>>,
    {
        let span = tracing::info_span!(
            "dependency_call",
            dependency = %breaker.name(),
            trace_id = %trace_label(ctx.trace_id()),
        );

        let Some(deadline) = ctx.deadline() else {
            return self.run(breaker, ctx, op).instrument(span).await;
        };

        let bounded = tokio::time::timeout_at(deadline, self.run(breaker, ctx, op));
        match bounded.instrument(span.clone()).await {
            Ok(result) => result,
            Err(_) => {
                span.in_scope(|| tracing::warn!("caller deadline exceeded, abandoning call"));
                Err(CanonicalError::deadline_exceeded(breaker.name()).with_trace(ctx.trace_id()))
            }
        }
    }

    async fn run<F, Fut, T>(
        &self,
        breaker: &CircuitBreaker,
        ctx: &CallContext,
        mut op: F,
    ) -> Result<T, CanonicalError>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, CanonicalError>>,
    {
        let dependency = breaker.name();
        let trace = ctx.trace_id();
        let per_call_timeout = self.policy.per_call_timeout;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for index in 0..max_attempts {
            let attempt = Attempt {
                index,
                trace_id: trace.cloned(),
                bearer_token: ctx.bearer_token().cloned(),
            };

            let outcome = breaker
                .call(|| {
                    let call = op(attempt);
                    async move {
                        match per_call_timeout {
                            Some(limit) => match tokio::time::timeout(limit, call).await {
                                Ok(result) => result,
                                Err(_) => Err(CanonicalError::timeout(dependency, limit)),
                            },
                            None => call.await,
                        }
                    }
                })
                .await;

            let error = match outcome {
                Ok(value) => {
                    if index > 0 {
                        tracing::info!(attempts = index + 1, "call succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(CircuitError::Open { retry_after, .. }) => {
                    tracing::error!(
                        retry_after_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
                        "circuit open, rejecting call"
                    );
                    return Err(CanonicalError::circuit_open(
                        dependency,
                        format!("circuit open, retry after {}s", retry_after.as_secs()),
                    )
                    .with_trace(trace));
                }
                Err(CircuitError::TrialInFlight { .. }) => {
                    tracing::warn!("circuit half-open with trial in flight, rejecting call");
                    return Err(CanonicalError::circuit_open(
                        dependency,
                        "circuit half-open, trial call in flight",
                    )
                    .with_trace(trace));
                }
                Err(CircuitError::Execution(error)) => attach_trace(error, trace),
            };

            match self.classifier.classify(&error) {
                Disposition::Terminal => {
                    tracing::debug!(
                        attempt = index + 1,
                        code = %error.code(),
                        status = error.status_code(),
                        "terminal failure, not retrying"
                    );
                    return Err(error);
                }
                Disposition::Retryable if index + 1 < max_attempts => {
                    let delay = backoff_delay(self.policy.base_delay, index);
                    tracing::warn!(
                        attempt = index + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        code = %error.code(),
                        status = error.status_code(),
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Disposition::Retryable => {}
            }
            last_error = Some(error);
        }

        tracing::error!(attempts = max_attempts, "retries exhausted");
        let details = match last_error {
            Some(error) => format!("{max_attempts} attempts failed; last error: {error}"),
            None => format!("{max_attempts} attempts failed"),
        };
        Err(
            CanonicalError::communication(format!("Failed to communicate with {dependency}"))
                .with_details(details)
                .with_trace(trace),
        )
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

fn attach_trace(error: CanonicalError, trace: Option<&TraceId>) -> CanonicalError {
    if error.trace_id().is_some() {
        error
    } else {
        error.with_trace(trace)
    }
}
