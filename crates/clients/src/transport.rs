//! Wire transports for the two dependencies
//!
//! The student registry speaks JSON REST and wraps payloads in a `data`
//! envelope. The course catalog is an RPC endpoint: every call is a POST of
//! `{operation, params}` answered by either `{"result": ...}` or
//! `{"fault": {code, message}}`. Both transports forward the caller's trace
//! id in [`TRACE_HEADER`] and bearer token in `Authorization`, and report
//! failures as [`DownstreamFailure`]s for the fault translator.

use crate::connection::Connector;
use async_trait::async_trait;
use registrar_breaker::{Attempt, DownstreamFailure, TransportErrorKind};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const TRACE_HEADER: &str = "X-Trace-Id";

/// One call against a dependency
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// Path below the endpoint (REST) or operation name (RPC)
    pub target: String,
    /// JSON body (REST, `GET` when null) or operation parameters (RPC)
    pub params: Value,
}

impl OutboundRequest {
    pub fn new(target: impl Into<String>, params: Value) -> Self {
        Self {
            target: target.into(),
            params,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, Value::Null)
    }
}

/// "Invoke, get result-or-failure"
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(
        &self,
        request: &OutboundRequest,
        attempt: &Attempt,
    ) -> Result<Value, DownstreamFailure>;
}

/// JSON REST transport (student registry)
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    base_url: String,
}

impl RestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DownstreamFailure> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn invoke(
        &self,
        request: &OutboundRequest,
        attempt: &Attempt,
    ) -> Result<Value, DownstreamFailure> {
        let url = format!("{}{}", self.base_url, request.target);
        let builder = if request.params.is_null() {
            self.client.get(&url)
        } else {
            self.client.post(&url).json(&request.params)
        };

        let response = with_call_headers(builder, attempt)
            .send()
            .await
            .map_err(transport_failure)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_failure)?;
        rest_payload(status, body)
    }
}

/// JSON RPC transport (course catalog)
#[derive(Debug, Clone)]
pub struct RpcTransport {
    client: Client,
    endpoint: String,
}

impl RpcTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, DownstreamFailure> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.to_string(),
        })
    }

    /// Fetch the service descriptor; fails if the endpoint is not serving
    pub async fn describe(&self) -> Result<Value, DownstreamFailure> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(transport_failure)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_failure)?;

        if !is_success(status) {
            return Err(DownstreamFailure::Http { status, body });
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

#[async_trait]
impl Transport for RpcTransport {
    async fn invoke(
        &self,
        request: &OutboundRequest,
        attempt: &Attempt,
    ) -> Result<Value, DownstreamFailure> {
        let envelope = json!({
            "operation": request.target,
            "params": request.params,
        });
        let builder = self.client.post(&self.endpoint).json(&envelope);

        let response = with_call_headers(builder, attempt)
            .send()
            .await
            .map_err(transport_failure)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_failure)?;
        rpc_payload(status, body)
    }
}

/// Builds a [`RestTransport`]; nothing is contacted until the first call
#[derive(Debug, Clone)]
pub struct RestConnector {
    pub base_url: String,
    pub timeout: Duration,
}

#[async_trait]
impl Connector<dyn Transport> for RestConnector {
    async fn connect(&self) -> Result<Arc<dyn Transport>, DownstreamFailure> {
        Ok(Arc::new(RestTransport::new(&self.base_url, self.timeout)?))
    }
}

/// Builds an [`RpcTransport`] once the service descriptor answers
#[derive(Debug, Clone)]
pub struct RpcConnector {
    pub endpoint: String,
    pub timeout: Duration,
}

#[async_trait]
impl Connector<dyn Transport> for RpcConnector {
    async fn connect(&self) -> Result<Arc<dyn Transport>, DownstreamFailure> {
        let transport = RpcTransport::new(&self.endpoint, self.timeout)?;
        transport.describe().await?;
        Ok(Arc::new(transport))
    }
}

fn http_client(timeout: Duration) -> Result<Client, DownstreamFailure> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(transport_failure)
}

/// Attach the trace id and bearer token
///
/// A value that is not a valid header is dropped with a warning.
fn with_call_headers(mut builder: RequestBuilder, attempt: &Attempt) -> RequestBuilder {
    if let Some(trace) = &attempt.trace_id {
        match HeaderValue::from_str(trace.as_str()) {
            Ok(value) => builder = builder.header(TRACE_HEADER, value),
            Err(_) => tracing::warn!(
                trace_id = %trace,
                "trace id is not a valid header value, not forwarding it"
            ),
        }
    }

    if let Some(token) = &attempt.bearer_token {
        match HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                builder = builder.header(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("bearer token is not a valid header value, not forwarding it"),
        }
    }

    builder
}

fn transport_failure(error: reqwest::Error) -> DownstreamFailure {
    // Request construction failed locally; nothing was sent
    if error.is_builder() {
        return DownstreamFailure::Unexpected(format!("could not build request: {error}"));
    }

    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::ConnectionRefused
    } else {
        TransportErrorKind::Other
    };

    DownstreamFailure::Transport {
        kind,
        message: error.to_string(),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_json(body: &str) -> Result<Value, DownstreamFailure> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| DownstreamFailure::Unexpected(format!("invalid JSON response: {e}")))
}

/// Unwrap a REST response, stripping the `data` envelope
fn rest_payload(status: u16, body: String) -> Result<Value, DownstreamFailure> {
    if !is_success(status) {
        return Err(DownstreamFailure::Http { status, body });
    }

    match parse_json(&body)? {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => Ok(data),
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

/// Unwrap an RPC response; a fault envelope wins over the HTTP status
fn rpc_payload(status: u16, body: String) -> Result<Value, DownstreamFailure> {
    let parsed = match parse_json(&body) {
        Ok(value) => value,
        Err(_) if !is_success(status) => return Err(DownstreamFailure::Http { status, body }),
        Err(failure) => return Err(failure),
    };

    if let Some(fault) = parsed.get("fault").filter(|fault| fault.is_object()) {
        let field = |name: &str| {
            fault
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        return Err(DownstreamFailure::Protocol {
            code: field("code"),
            message: field("message"),
        });
    }

    if !is_success(status) {
        return Err(DownstreamFailure::Http { status, body });
    }

    Ok(match parsed {
        Value::Object(mut map) => map.remove("result").unwrap_or(Value::Null),
        _ => Value::Null,
    })
}
