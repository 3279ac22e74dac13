//! Fault translation into the canonical error taxonomy
//!
//! Downstream dependencies fail in different vocabularies: structured protocol
//! faults, HTTP error responses, transport failures. [`FaultTranslator`] maps
//! every one of them onto exactly one [`CanonicalError`], so callers only ever
//! see the codes listed in [`ErrorCode`].

use crate::trace::{TraceId, trace_label};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Symbolic error codes shared by every service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Breaker rejected admission
    CircuitOpen,
    AuthRequired,
    NotFound,
    /// Transport failure, timeout or 5xx
    CommunicationError,
    /// Uncategorised application-level fault reported by the dependency
    RemoteFault,
    UnknownError,
    /// Code passed through verbatim from a structured downstream response
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::CircuitOpen => "SVC_CIRCUIT_OPEN",
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::NotFound => "RES_NOT_FOUND",
            ErrorCode::CommunicationError => "SVC_COMMUNICATION_ERROR",
            ErrorCode::RemoteFault => "SVC_REMOTE_FAULT",
            ErrorCode::UnknownError => "SVC_UNKNOWN_ERROR",
            ErrorCode::Other(code) => code,
        }
    }

    /// Parse a code string, recognising the taxonomy's own codes
    pub fn parse(code: &str) -> Self {
        match code {
            "SVC_CIRCUIT_OPEN" => ErrorCode::CircuitOpen,
            "AUTH_REQUIRED" => ErrorCode::AuthRequired,
            "RES_NOT_FOUND" => ErrorCode::NotFound,
            "SVC_COMMUNICATION_ERROR" => ErrorCode::CommunicationError,
            "SVC_REMOTE_FAULT" => ErrorCode::RemoteFault,
            "SVC_UNKNOWN_ERROR" => ErrorCode::UnknownError,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The single error type surfaced to callers of a dependency
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("[{code}] {message}")]
#[serde(rename_all = "camelCase")]
pub struct CanonicalError {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<TraceId>,
}

impl CanonicalError {
    pub fn new(code: ErrorCode, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            status_code,
            trace_id: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_trace(mut self, trace: Option<&TraceId>) -> Self {
        self.trace_id = trace.cloned();
        self
    }

    pub fn circuit_open(dependency: &str, details: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CircuitOpen,
            format!("{dependency} is temporarily unavailable"),
            503,
        )
        .with_details(details)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message, 404)
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CommunicationError, message, 503)
    }

    /// A single attempt exceeded its per-call timeout
    pub fn timeout(dependency: &str, limit: Duration) -> Self {
        Self::communication(format!("Request to {dependency} timed out"))
            .with_details(format!("no response within {}ms", limit.as_millis()))
    }

    /// The caller's deadline expired before the call completed
    pub fn deadline_exceeded(dependency: &str) -> Self {
        Self::communication(format!("Request to {dependency} timed out"))
            .with_details("caller deadline exceeded")
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    pub fn is_circuit_open(&self) -> bool {
        self.code == ErrorCode::CircuitOpen
    }
}

/// Class of transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    ConnectionRefused,
    Timeout,
    Other,
}

/// Raw failure as reported by a dependency's transport
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DownstreamFailure {
    /// Structured remote fault carrying its own code and message
    #[error("protocol fault {code}: {message}")]
    Protocol { code: String, message: String },
    /// The call never produced a response
    #[error("transport failure ({kind:?}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
    /// A response arrived with an error status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{0}")]
    Unexpected(String),
}

/// Maps a dependency's failures into [`CanonicalError`]s
#[derive(Debug, Clone)]
pub struct FaultTranslator {
    dependency: String,
}

impl FaultTranslator {
    /// `dependency` is the display name used in messages ("Courses Service")
    pub fn new(dependency: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn translate(&self, failure: DownstreamFailure, trace: Option<&TraceId>) -> CanonicalError {
        let error = match failure {
            DownstreamFailure::Protocol { code, message } => self.protocol_fault(code, message),
            DownstreamFailure::Transport { kind, message } => {
                let text = match kind {
                    TransportErrorKind::Timeout => format!("Request to {} timed out", self.dependency),
                    _ => format!("Failed to communicate with {}", self.dependency),
                };
                CanonicalError::communication(text).with_details(message)
            }
            DownstreamFailure::Http { status, body } if status >= 400 => {
                self.http_error(status, body)
            }
            DownstreamFailure::Http { status, body } => CanonicalError::new(
                ErrorCode::UnknownError,
                format!("Unexpected response from {}", self.dependency),
                500,
            )
            .with_details(format!("HTTP {status}: {body}")),
            DownstreamFailure::Unexpected(description) => CanonicalError::new(
                ErrorCode::UnknownError,
                format!("Unexpected error calling {}", self.dependency),
                500,
            )
            .with_details(description),
        };

        tracing::warn!(
            dependency = %self.dependency,
            trace_id = %trace_label(trace),
            code = %error.code(),
            status = error.status_code(),
            "downstream failure translated"
        );
        error.with_trace(trace)
    }

    /// The connection could not be set up, so no call reached the dependency
    ///
    /// Whatever the connector saw (even a 404 with a JSON body), this is
    /// the dependency being unavailable, never a statement about a resource.
    pub fn initialization_failed(
        &self,
        failure: DownstreamFailure,
        trace: Option<&TraceId>,
    ) -> CanonicalError {
        let error = CanonicalError::communication(format!(
            "Failed to communicate with {}",
            self.dependency
        ))
        .with_details(format!("connection initialisation failed: {failure}"));

        tracing::warn!(
            dependency = %self.dependency,
            trace_id = %trace_label(trace),
            error = %failure,
            "dependency connection could not be initialised"
        );
        error.with_trace(trace)
    }

    fn protocol_fault(&self, code: String, message: String) -> CanonicalError {
        let upper = message.to_uppercase();

        if upper.contains("AUTH") {
            CanonicalError::new(
                ErrorCode::AuthRequired,
                format!("Authentication required for {}", self.dependency),
                401,
            )
            .with_details(message)
        } else if upper.contains("NOT_FOUND") || upper.contains("NOT FOUND") {
            CanonicalError::not_found(format!("Resource not found in {}", self.dependency))
                .with_details(message)
        } else {
            CanonicalError::new(
                ErrorCode::RemoteFault,
                format!("Remote fault from {}: {code}", self.dependency),
                500,
            )
            .with_details(format!("{code}: {message}"))
        }
    }

    fn http_error(&self, status: u16, body: String) -> CanonicalError {
        if let Some(error) = structured_error(&body, status) {
            return error;
        }

        CanonicalError::communication(format!("{} returned {status}", self.dependency))
            .with_status(status)
            .with_details(body)
    }
}

impl CanonicalError {
    fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }
}

/// Read `{code, message, details}` from a JSON body, at the top level or
/// nested under `error`
fn structured_error(body: &str, status: u16) -> Option<CanonicalError> {
    let value: Value = serde_json::from_str(body).ok()?;
    let payload = match value.get("error") {
        Some(nested) if nested.is_object() => nested,
        _ => &value,
    };

    let code = payload.get("code").and_then(Value::as_str);
    let message = payload.get("message").and_then(Value::as_str);
    if code.is_none() && message.is_none() {
        return None;
    }

    let code = match code {
        Some(code) => ErrorCode::parse(code),
        None => code_for_status(status),
    };
    let mut error = CanonicalError::new(
        code,
        message.unwrap_or("Downstream request failed"),
        status,
    );
    // Some services put a short reason string under `error` instead
    let details = payload
        .get("details")
        .or_else(|| value.get("error").filter(|reason| reason.is_string()));
    match details {
        Some(Value::String(details)) => error = error.with_details(details.clone()),
        Some(Value::Null) | None => {}
        Some(other) => error = error.with_details(other.to_string()),
    }
    Some(error)
}

fn code_for_status(status: u16) -> ErrorCode {
    match status {
        401 => ErrorCode::AuthRequired,
        404 => ErrorCode::NotFound,
        _ => ErrorCode::CommunicationError,
    }
}
