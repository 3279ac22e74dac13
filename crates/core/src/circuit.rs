//! Per-dependency circuit breaker: Closed, Open and HalfOpen over consecutive outcomes
//!
//! The lifecycle (Closed → Open → HalfOpen → Closed) is declared with
//! `state_machines`. [`CircuitBreaker`] keeps the machine behind a mutex that
//! guards only two short critical sections: admitting a call (which may move
//! Open → HalfOpen) and recording its outcome. The protected operation itself
//! always runs with the lock released.

use crate::{
    callbacks::{Callbacks, Transition},
    errors::CircuitError,
    ledger::Ledger,
    trial::{TrialGate, TrialPermit},
};
use serde::Serialize;
use state_machines::state_machine;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Thresholds for one dependency
#[derive(Debug, Clone)]
pub struct Config {
    /// Consecutive failures (while Closed) required to open the circuit
    pub failure_threshold: usize,

    /// Cool-down after the last failure before a trial call is admitted
    pub reset_timeout: Duration,

    /// Consecutive HalfOpen successes required to close the circuit
    pub success_threshold: usize,

    /// Trial calls allowed in flight at once while HalfOpen
    pub half_open_max_trials: usize,

    /// Jitter factor for reset_timeout (0.0 = exact timeout, 1.0 = full jitter)
    /// Spread is `timeout * (1 - jitter + rand * jitter)`
    pub jitter_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            success_threshold: 2,
            half_open_max_trials: 1,
            jitter_factor: 0.0,
        }
    }
}

impl Config {
    /// Thresholds raised to at least 1, jitter kept within [0, 1] (NaN is 0)
    pub fn normalized(mut self) -> Self {
        self.failure_threshold = self.failure_threshold.max(1);
        self.success_threshold = self.success_threshold.max(1);
        self.half_open_max_trials = self.half_open_max_trials.max(1);
        self.jitter_factor = if self.jitter_factor.is_nan() {
            0.0
        } else {
            self.jitter_factor.clamp(0.0, 1.0)
        };
        self
    }
}

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn from_machine(name: &str) -> Self {
        match name {
            "Open" => CircuitState::Open,
            "HalfOpen" => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read by the transition guards in every state
#[derive(Clone)]
pub struct CircuitContext {
    pub name: String,
    pub config: Config,
    pub ledger: Arc<Ledger>,
}

impl Default for CircuitContext {
    fn default() -> Self {
        Self {
            name: String::new(),
            config: Config::default(),
            ledger: Arc::new(Ledger::new()),
        }
    }
}

impl fmt::Debug for CircuitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitContext")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("failures", &self.ledger.failure_count())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenData {
    /// Ledger time (seconds) at which the circuit last opened
    pub opened_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HalfOpenData {
    pub consecutive_successes: usize,
}

state_machine! {
    name: Circuit,
    context: CircuitContext,
    dynamic: true,

    initial: Closed,
    states: [
        Closed,
        Open(OpenData),
        HalfOpen(HalfOpenData),
    ],
    events {
        trip {
            guards: [should_open],
            transition: { from: [Closed, HalfOpen], to: Open }
        }
        attempt_reset {
            guards: [timeout_elapsed],
            transition: { from: Open, to: HalfOpen }
        }
        close {
            guards: [should_close],
            transition: { from: HalfOpen, to: Closed }
        }
    }
}

impl Circuit<Closed> {
    fn should_open(&self, ctx: &CircuitContext) -> bool {
        ctx.ledger.failure_count() >= ctx.config.failure_threshold
    }
}

impl Circuit<HalfOpen> {
    /// A single failed trial reopens the circuit
    fn should_open(&self, _ctx: &CircuitContext) -> bool {
        true
    }

    fn should_close(&self, ctx: &CircuitContext) -> bool {
        self.state_data_half_open()
            .map(|data| data.consecutive_successes >= ctx.config.success_threshold)
            .unwrap_or(false)
    }
}

impl Circuit<Open> {
    fn timeout_elapsed(&self, ctx: &CircuitContext) -> bool {
        match ctx.ledger.last_failure_age() {
            Some(age) => age >= effective_reset_timeout(&ctx.config),
            None => true,
        }
    }
}

/// Reset timeout after applying the configured jitter
fn effective_reset_timeout(config: &Config) -> Duration {
    if config.jitter_factor <= 0.0 {
        return config.reset_timeout;
    }

    let base_ms = u64::try_from(config.reset_timeout.as_millis()).unwrap_or(u64::MAX);
    let policy = chrono_machines::Policy {
        max_attempts: 1,
        base_delay_ms: base_ms,
        multiplier: 1.0,
        max_delay_ms: base_ms,
    };
    let timeout_ms = policy.calculate_delay(1, config.jitter_factor);
    Duration::from_millis(timeout_ms as u64)
}

/// Point-in-time view of a breaker, for health and metrics endpoints
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: usize,
    pub half_open_successes: usize,
    pub trials_in_flight: usize,
    pub last_failure_age_ms: Option<u64>,
}

pub struct CircuitBreaker {
    machine: Mutex<DynamicCircuit>,
    context: CircuitContext,
    trials: Arc<TrialGate>,
    callbacks: Callbacks,
}

impl CircuitBreaker {
    /// Breaker for `name` with `config`, normalised like the builder's
    pub fn new(name: impl Into<String>, config: Config) -> Self {
        let context = CircuitContext {
            name: name.into(),
            config: config.normalized(),
            ledger: Arc::new(Ledger::new()),
        };
        Self::with_context_and_callbacks(context, Callbacks::new())
    }

    pub(crate) fn with_context_and_callbacks(context: CircuitContext, callbacks: Callbacks) -> Self {
        let trials = Arc::new(TrialGate::new(context.config.half_open_max_trials));
        let machine = Mutex::new(DynamicCircuit::new(context.clone()));

        Self {
            machine,
            context,
            trials,
            callbacks,
        }
    }

    pub fn builder(name: impl Into<String>) -> crate::builder::CircuitBuilder {
        crate::builder::CircuitBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.context.name
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }

    /// Run `op` under breaker protection
    ///
    /// Rejects with [`CircuitError::Open`] (without invoking `op`) while the
    /// reset timeout has not elapsed. Otherwise `op` is invoked exactly once,
    /// its outcome is recorded, and its result is passed through, with errors
    /// wrapped in [`CircuitError::Execution`].
    pub async fn call<F, Fut, T, E>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _trial = self.admit()?;

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitError::Execution(e))
            }
        }
    }

    /// Blocking counterpart of [`call`](Self::call) for thread-based callers
    pub fn call_blocking<F, T, E>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let _trial = self.admit()?;

        match op() {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitError::Execution(e))
            }
        }
    }

    /// Admission check; moves Open → HalfOpen once the reset timeout elapsed
    fn admit<E>(&self) -> Result<Option<TrialPermit>, CircuitError<E>> {
        let mut transition = None;

        let admission = {
            let mut machine = self.lock();

            if machine.current_state() == "Open"
                && machine.handle(CircuitEvent::AttemptReset).is_ok()
            {
                tracing::info!(circuit = %self.context.name, "circuit transitioning to half-open");
                transition = Some(Transition::HalfOpened);
            }

            match machine.current_state() {
                "Open" => Err(CircuitError::Open {
                    circuit: self.context.name.clone(),
                    retry_after: self.retry_after(),
                }),
                "HalfOpen" => match self.trials.try_acquire() {
                    Some(permit) => Ok(Some(permit)),
                    None => Err(CircuitError::TrialInFlight {
                        circuit: self.context.name.clone(),
                    }),
                },
                _ => Ok(None),
            }
        };

        if let Some(transition) = transition {
            self.callbacks.fire(&self.context.name, transition);
        }
        admission
    }

    /// Record a successful outcome and drive HalfOpen → Closed transitions
    pub fn record_success(&self) {
        let transition = {
            let mut machine = self.lock();

            match machine.current_state() {
                "Closed" => {
                    self.context.ledger.reset_failures();
                    None
                }
                "HalfOpen" => {
                    let successes = match machine.half_open_data_mut() {
                        Some(data) => {
                            data.consecutive_successes += 1;
                            data.consecutive_successes
                        }
                        None => 0,
                    };

                    if machine.handle(CircuitEvent::Close).is_ok() {
                        self.context.ledger.reset_failures();
                        tracing::info!(
                            circuit = %self.context.name,
                            successes,
                            "circuit closing after successful recovery"
                        );
                        Some(Transition::Closed)
                    } else {
                        tracing::info!(
                            circuit = %self.context.name,
                            successes,
                            required = self.context.config.success_threshold,
                            "trial call succeeded in half-open state"
                        );
                        None
                    }
                }
                // Late success of a call admitted before the circuit opened
                _ => None,
            }
        };

        if let Some(transition) = transition {
            self.callbacks.fire(&self.context.name, transition);
        }
    }

    /// Record a failed outcome and attempt to trip the circuit
    pub fn record_failure(&self) {
        let transition = {
            let mut machine = self.lock();
            let failures = self.context.ledger.record_failure();
            let from = machine.current_state();

            if from != "Open" && machine.handle(CircuitEvent::Trip).is_ok() {
                self.mark_open(&mut machine);
                if from == "HalfOpen" {
                    tracing::warn!(
                        circuit = %self.context.name,
                        "trial call failed in half-open state, reopening circuit"
                    );
                } else {
                    tracing::error!(
                        circuit = %self.context.name,
                        failures,
                        "failure threshold reached, opening circuit"
                    );
                }
                Some(Transition::Opened)
            } else {
                None
            }
        };

        if let Some(transition) = transition {
            self.callbacks.fire(&self.context.name, transition);
        }
    }

    /// Current state (observability only)
    pub fn state(&self) -> CircuitState {
        CircuitState::from_machine(self.lock().current_state())
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    pub fn failure_count(&self) -> usize {
        self.context.ledger.failure_count()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let machine = self.lock();
        let half_open_successes = machine
            .half_open_data()
            .map(|data| data.consecutive_successes)
            .unwrap_or(0);

        BreakerSnapshot {
            name: self.context.name.clone(),
            state: CircuitState::from_machine(machine.current_state()),
            failure_count: self.context.ledger.failure_count(),
            half_open_successes,
            trials_in_flight: self.trials.in_flight(),
            last_failure_age_ms: self
                .context
                .ledger
                .last_failure_age()
                .map(|age| u64::try_from(age.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// Force the circuit back to Closed, clearing counters and failure time
    pub fn reset(&self) {
        let mut machine = self.lock();
        *machine = DynamicCircuit::new(self.context.clone());
        self.context.ledger.clear();
        tracing::info!(circuit = %self.context.name, "circuit manually reset to closed");
    }

    fn retry_after(&self) -> Duration {
        let age = self.context.ledger.last_failure_age().unwrap_or_default();
        self.context.config.reset_timeout.saturating_sub(age)
    }

    fn mark_open(&self, machine: &mut DynamicCircuit) {
        if let Some(data) = machine.open_data_mut() {
            data.opened_at = self.context.ledger.monotonic_time();
        }
    }

    fn lock(&self) -> MutexGuard<'_, DynamicCircuit> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.context.name)
            .field("state", &self.state())
            .field("failures", &self.context.ledger.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn breaker(failure_threshold: usize, success_threshold: usize) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            Config {
                failure_threshold,
                success_threshold,
                reset_timeout: Duration::from_secs(60),
                ..Default::default()
            },
        )
    }

    async fn fail(circuit: &CircuitBreaker) {
        let _ = circuit.call(|| async { Err::<(), _>("boom") }).await;
    }

    async fn succeed(circuit: &CircuitBreaker) {
        let _ = circuit.call(|| async { Ok::<_, &str>(()) }).await;
    }

    #[test]
    fn test_circuit_breaker_creation() {
        let circuit = CircuitBreaker::new("test", Config::default());

        assert!(circuit.is_closed());
        assert_eq!(circuit.failure_count(), 0);
        assert_eq!(circuit.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_and_rejects_without_invoking() {
        let circuit = breaker(3, 2);
        let invoked = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = circuit
                .call(|| async {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("unavailable")
                })
                .await;
            assert!(matches!(result, Err(CircuitError::Execution("unavailable"))));
        }
        assert_eq!(circuit.state(), CircuitState::Open);

        let result = circuit
            .call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(())
            })
            .await;

        assert!(matches!(result, Err(CircuitError::Open { .. })));
        assert_eq!(invoked.load(Ordering::SeqCst), 3, "open circuit must not invoke");
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_while_closed_resets_failures() {
        let circuit = breaker(3, 2);

        fail(&circuit).await;
        fail(&circuit).await;
        succeed(&circuit).await;
        assert_eq!(circuit.failure_count(), 0);

        fail(&circuit).await;
        fail(&circuit).await;
        assert!(circuit.is_closed(), "failures must be consecutive to trip");
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_rejects_until_reset_timeout() {
        let circuit = breaker(1, 2);
        fail(&circuit).await;
        assert!(circuit.is_open());

        tokio::time::advance(Duration::from_secs(59)).await;
        let result = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        match result {
            Err(CircuitError::Open { circuit: name, retry_after }) => {
                assert_eq!(name, "test");
                assert!(retry_after <= Duration::from_secs(1));
            }
            other => panic!("expected Open rejection, got {other:?}"),
        }
        assert!(circuit.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trial_after_timeout_then_close() {
        let circuit = breaker(1, 2);
        fail(&circuit).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        let result = circuit.call(|| async { Ok::<_, &str>("recovered") }).await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
        assert_eq!(circuit.snapshot().half_open_successes, 1);

        succeed(&circuit).await;
        assert_eq!(circuit.state(), CircuitState::Closed);
        let snapshot = circuit.snapshot();
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.half_open_successes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens_and_discards_successes() {
        let circuit = breaker(1, 3);
        fail(&circuit).await;
        tokio::time::advance(Duration::from_secs(60)).await;

        succeed(&circuit).await;
        succeed(&circuit).await;
        assert_eq!(circuit.snapshot().half_open_successes, 2);

        fail(&circuit).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(60)).await;
        succeed(&circuit).await;
        assert_eq!(circuit.state(), CircuitState::HalfOpen);
        assert_eq!(
            circuit.snapshot().half_open_successes,
            1,
            "success count restarts after reopening"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_failure_while_open_extends_cool_down() {
        let circuit = breaker(1, 2);
        fail(&circuit).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        circuit.record_failure();
        assert!(circuit.is_open());

        tokio::time::advance(Duration::from_secs(40)).await;
        let result = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitError::Open { .. })));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(circuit.call(|| async { Ok::<_, &str>(()) }).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_from_open_and_half_open() {
        let circuit = breaker(2, 2);
        fail(&circuit).await;
        fail(&circuit).await;
        assert!(circuit.is_open());

        circuit.reset();
        let snapshot = circuit.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.failure_count, 0);
        assert_eq!(snapshot.half_open_successes, 0);
        assert!(snapshot.last_failure_age_ms.is_none());

        fail(&circuit).await;
        fail(&circuit).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        succeed(&circuit).await;
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        circuit.reset();
        assert!(circuit.is_closed());
        assert_eq!(circuit.snapshot().half_open_successes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_runs_outside_state_lock() {
        let circuit = breaker(3, 2);

        let result = circuit
            .call(|| async {
                // Would deadlock if the state lock were held across the call
                assert_eq!(circuit.state(), CircuitState::Closed);
                Ok::<_, &str>(circuit.snapshot().failure_count)
            })
            .await;

        assert_eq!(result.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_single_trial() {
        let circuit = breaker(1, 1);
        fail(&circuit).await;
        tokio::time::advance(Duration::from_secs(60)).await;

        let (release, hold) = oneshot::channel::<()>();
        let second_invoked = AtomicUsize::new(0);
        let (circuit_ref, invoked_ref) = (&circuit, &second_invoked);

        let trial = circuit.call(|| async move {
            let _ = hold.await;
            Ok::<_, &str>("trial")
        });
        let competing = async move {
            tokio::task::yield_now().await;
            let result = circuit_ref
                .call(|| async {
                    invoked_ref.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &str>("competitor")
                })
                .await;
            let _ = release.send(());
            result
        };

        let (trial, competing) = tokio::join!(trial, competing);

        assert_eq!(trial.unwrap(), "trial");
        assert!(matches!(competing, Err(CircuitError::TrialInFlight { .. })));
        assert_eq!(second_invoked.load(Ordering::SeqCst), 0);
        assert!(circuit.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_fire_on_transitions() {
        let opened = Arc::new(AtomicUsize::new(0));
        let half_opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let circuit = {
            let (o, h, c) = (opened.clone(), half_opened.clone(), closed.clone());
            CircuitBreaker::builder("hooks")
                .failure_threshold(1)
                .success_threshold(1)
                .reset_timeout(Duration::from_secs(5))
                .on_open(move |_| {
                    o.fetch_add(1, Ordering::SeqCst);
                })
                .on_half_open(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                })
                .on_close(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .build()
        };

        fail(&circuit).await;
        tokio::time::advance(Duration::from_secs(5)).await;
        succeed(&circuit).await;

        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(half_opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocking_calls_from_many_threads() {
        let circuit = Arc::new(breaker(8, 2));
        let mut handles = vec![];

        for _ in 0..8 {
            let circuit = Arc::clone(&circuit);
            handles.push(std::thread::spawn(move || {
                let _ = circuit.call_blocking(|| Err::<(), _>("down"));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(circuit.is_open());
        let rejected = circuit.call_blocking(|| Ok::<_, &str>(()));
        assert!(matches!(rejected, Err(CircuitError::Open { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_only_shortens_reset_timeout() {
        let circuit = CircuitBreaker::builder("jitter")
            .failure_threshold(1)
            .reset_timeout(Duration::from_secs(10))
            .jitter_factor(0.5)
            .build();

        fail(&circuit).await;
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(circuit.call(|| async { Ok::<_, &str>(()) }).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_normalizes_config() {
        let circuit = CircuitBreaker::new(
            "Courses Service",
            Config {
                failure_threshold: 0,
                success_threshold: 0,
                half_open_max_trials: 0,
                reset_timeout: Duration::from_secs(10),
                jitter_factor: f64::NAN,
            },
        );
        let config = circuit.config();

        assert_eq!(config.failure_threshold, 1);
        assert_eq!(config.success_threshold, 1);
        assert_eq!(config.half_open_max_trials, 1);
        assert_eq!(config.jitter_factor, 0.0);

        fail(&circuit).await;
        assert!(circuit.is_open());
        tokio::time::advance(Duration::from_secs(9)).await;
        let result = circuit.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(
            matches!(result, Err(CircuitError::Open { .. })),
            "NaN jitter must not collapse the reset timeout"
        );
    }

    #[test]
    fn test_normalized_clamps_jitter_range() {
        let high = Config {
            jitter_factor: 3.0,
            ..Default::default()
        };
        let low = Config {
            jitter_factor: -1.0,
            ..Default::default()
        };

        assert_eq!(high.normalized().jitter_factor, 1.0);
        assert_eq!(low.normalized().jitter_factor, 0.0);
    }

    #[test]
    fn test_zero_jitter_produces_exact_timeout() {
        let config = Config {
            reset_timeout: Duration::from_millis(1500),
            ..Default::default()
        };

        assert_eq!(effective_reset_timeout(&config), Duration::from_millis(1500));
    }
}
