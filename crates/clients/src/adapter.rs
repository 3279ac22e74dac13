//! Dependency client: the uniform entry point every adapter verb reduces to
//!
//! Each dependency owns exactly one breaker, one retry executor, one fault
//! translator and one lazily initialised transport. Nothing is shared across
//! dependencies.

use crate::config::DependencyConfig;
use crate::connection::{ConnectionStatus, Connector, LazyConnection};
use crate::transport::{OutboundRequest, Transport};
use registrar_breaker::{
    BreakerSnapshot, CallContext, CanonicalError, CircuitBreaker, CircuitState,
    DownstreamFailure, FaultTranslator, RetryExecutor, TraceId,
};
use serde::Serialize;
use serde_json::Value;

/// Health view of one dependency
#[derive(Debug, Clone, Serialize)]
pub struct DependencyHealth {
    pub dependency: String,
    pub state: CircuitState,
    pub breaker: BreakerSnapshot,
    pub connection: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_error: Option<String>,
}

pub struct DependencyClient {
    breaker: CircuitBreaker,
    executor: RetryExecutor,
    translator: FaultTranslator,
    connection: LazyConnection<dyn Transport>,
}

impl DependencyClient {
    pub fn new(
        breaker: CircuitBreaker,
        executor: RetryExecutor,
        connector: Box<dyn Connector<dyn Transport>>,
    ) -> Self {
        let name = breaker.name().to_string();
        Self {
            translator: FaultTranslator::new(name.clone()),
            connection: LazyConnection::new(name, connector),
            breaker,
            executor,
        }
    }

    pub fn from_config(
        name: &str,
        config: &DependencyConfig,
        connector: Box<dyn Connector<dyn Transport>>,
    ) -> Self {
        let breaker = CircuitBreaker::builder(name)
            .config(config.breaker_config())
            .build();
        let executor = RetryExecutor::new(config.retry_policy());
        Self::new(breaker, executor, connector)
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }

    /// Try to connect at startup; failure only defers initialisation
    pub async fn startup(&self) -> bool {
        self.connection.initialize().await
    }

    /// Invoke `request` with breaker protection, retries and fault translation
    pub async fn call(
        &self,
        ctx: &CallContext,
        request: &OutboundRequest,
    ) -> Result<Value, CanonicalError> {
        self.executor
            .execute(&self.breaker, ctx, |attempt| async move {
                let trace = attempt.trace_id.as_ref();
                tracing::debug!(
                    attempt = attempt.index + 1,
                    operation = %request.target,
                    "invoking dependency"
                );

                // Whatever the connector saw, the dependency is not reachable
                let transport = self
                    .connection
                    .get()
                    .await
                    .map_err(|failure| self.translator.initialization_failed(failure, trace))?;
                transport
                    .invoke(request, &attempt)
                    .await
                    .map_err(|failure| self.translate(failure, trace))
            })
            .await
    }

    pub fn translate(&self, failure: DownstreamFailure, trace: Option<&TraceId>) -> CanonicalError {
        self.translator.translate(failure, trace)
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Operator override: close the breaker and clear its history
    pub fn reset(&self) {
        self.breaker.reset();
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn health(&self) -> DependencyHealth {
        let breaker = self.breaker.snapshot();
        DependencyHealth {
            dependency: self.name().to_string(),
            state: breaker.state,
            breaker,
            connection: self.connection.status(),
            connection_error: self.connection.last_error(),
        }
    }
}

impl std::fmt::Debug for DependencyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyClient")
            .field("breaker", &self.breaker)
            .field("connection", &self.connection)
            .finish()
    }
}
