//! Fluent configuration for a dependency's breaker

use crate::{
    callbacks::Callbacks,
    circuit::{CircuitBreaker, CircuitContext, Config},
    ledger::Ledger,
};
use std::sync::Arc;
use std::time::Duration;

pub struct CircuitBuilder {
    name: String,
    config: Config,
    callbacks: Callbacks,
}

impl CircuitBuilder {
    /// `name` is the dependency's display name, used in errors and logs
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Config::default(),
            callbacks: Callbacks::new(),
        }
    }

    /// Replace the whole configuration at once
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Consecutive failures needed to open the circuit (at least 1)
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Cool-down between the last failure and the first trial call
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Consecutive HalfOpen successes needed to close the circuit (at least 1)
    pub fn success_threshold(mut self, threshold: usize) -> Self {
        self.config.success_threshold = threshold;
        self
    }

    /// Trial calls allowed in flight at once while HalfOpen (at least 1)
    pub fn half_open_max_trials(mut self, trials: usize) -> Self {
        self.config.half_open_max_trials = trials;
        self
    }

    /// Random spread applied to the reset timeout, within [0, 1]
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.config.jitter_factor = factor;
        self
    }

    /// Runs with the dependency name after the breaker opens
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_half_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_half_open = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> CircuitBreaker {
        let context = CircuitContext {
            name: self.name,
            config: self.config.normalized(),
            ledger: Arc::new(Ledger::new()),
        };

        CircuitBreaker::with_context_and_callbacks(context, self.callbacks)
    }
}
