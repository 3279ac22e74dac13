//! Scripted transport and connector shared by the unit tests

use crate::adapter::DependencyClient;
use crate::connection::Connector;
use crate::transport::{OutboundRequest, Transport};
use async_trait::async_trait;
use registrar_breaker::{
    Attempt, CircuitBreaker, DownstreamFailure, RetryExecutor, RetryPolicy, TransportErrorKind,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) type Scripted = Result<Value, DownstreamFailure>;

/// What the transport saw on one attempt
#[derive(Debug, Clone)]
struct Seen {
    request: OutboundRequest,
    trace: Option<String>,
    token: Option<String>,
}

/// Replays responses in order and records every request it sees
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<OutboundRequest> {
        let requests = self.requests.lock().unwrap();
        requests.iter().map(|seen| seen.request.clone()).collect()
    }

    pub(crate) fn traces(&self) -> Vec<Option<String>> {
        let requests = self.requests.lock().unwrap();
        requests.iter().map(|seen| seen.trace.clone()).collect()
    }

    pub(crate) fn tokens(&self) -> Vec<Option<String>> {
        let requests = self.requests.lock().unwrap();
        requests.iter().map(|seen| seen.token.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn invoke(
        &self,
        request: &OutboundRequest,
        attempt: &Attempt,
    ) -> Result<Value, DownstreamFailure> {
        self.requests.lock().unwrap().push(Seen {
            request: request.clone(),
            trace: attempt.trace_id.as_ref().map(|t| t.as_str().to_string()),
            token: attempt.bearer_token.as_ref().map(|t| t.as_str().to_string()),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DownstreamFailure::Unexpected("script exhausted".to_string())))
    }
}

/// Fails the first `failures` connects with `failure`
struct ScriptedConnector {
    transport: Arc<ScriptedTransport>,
    failures: AtomicUsize,
    failure: DownstreamFailure,
}

#[async_trait]
impl Connector<dyn Transport> for ScriptedConnector {
    async fn connect(&self) -> Result<Arc<dyn Transport>, DownstreamFailure> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(self.failure.clone());
        }
        Ok(self.transport.clone())
    }
}

/// Client with default breaker settings and 3 attempts 1s apart
pub(crate) fn scripted_client(
    name: &str,
    connect_failures: usize,
    responses: Vec<Scripted>,
) -> (DependencyClient, Arc<ScriptedTransport>) {
    let refused = DownstreamFailure::Transport {
        kind: TransportErrorKind::ConnectionRefused,
        message: "connection refused".to_string(),
    };
    scripted_client_failing_with(name, connect_failures, refused, responses)
}

/// Like [`scripted_client`], with the connect failure chosen by the test
pub(crate) fn scripted_client_failing_with(
    name: &str,
    connect_failures: usize,
    failure: DownstreamFailure,
    responses: Vec<Scripted>,
) -> (DependencyClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new(responses));
    let connector = ScriptedConnector {
        transport: Arc::clone(&transport),
        failures: AtomicUsize::new(connect_failures),
        failure,
    };
    let client = DependencyClient::new(
        CircuitBreaker::builder(name).build(),
        RetryExecutor::new(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            per_call_timeout: Some(Duration::from_secs(10)),
        }),
        Box::new(connector),
    );
    (client, transport)
}

pub(crate) fn unavailable() -> Scripted {
    Err(DownstreamFailure::Http {
        status: 503,
        body: "Service Unavailable".to_string(),
    })
}
