//! Lazily initialised transport connection
//!
//! A dependency that is unreachable at boot must not stop the process from
//! starting. [`LazyConnection`] records the failed attempt and retries the
//! initialisation on the next call. The state lock is never held across the
//! connect await, so concurrent callers may race to initialise; the first
//! successful initialiser wins and later ones adopt its connection.

use async_trait::async_trait;
use registrar_breaker::DownstreamFailure;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Produces a ready connection
#[async_trait]
pub trait Connector<T: ?Sized + Send + Sync>: Send + Sync {
    async fn connect(&self) -> Result<Arc<T>, DownstreamFailure>;
}

/// Connection state as reported by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Uninitialized,
    Ready,
    FailedInit,
}

enum ConnectionState<T: ?Sized> {
    Uninitialized,
    Ready(Arc<T>),
    FailedInit(String),
}

pub struct LazyConnection<T: ?Sized + Send + Sync> {
    name: String,
    connector: Box<dyn Connector<T>>,
    state: Mutex<ConnectionState<T>>,
}

impl<T: ?Sized + Send + Sync> LazyConnection<T> {
    pub fn new(name: impl Into<String>, connector: Box<dyn Connector<T>>) -> Self {
        Self {
            name: name.into(),
            connector,
            state: Mutex::new(ConnectionState::Uninitialized),
        }
    }

    /// Startup attempt; a failure is logged and remembered, never fatal
    pub async fn initialize(&self) -> bool {
        match self.get().await {
            Ok(_) => true,
            Err(failure) => {
                tracing::warn!(
                    dependency = %self.name,
                    error = %failure,
                    "connection unavailable at startup, will retry on first call"
                );
                false
            }
        }
    }

    /// Current connection, initialising it if needed
    pub async fn get(&self) -> Result<Arc<T>, DownstreamFailure> {
        if let Some(ready) = self.ready() {
            return Ok(ready);
        }

        let outcome = self.connector.connect().await;

        let mut state = self.lock();
        if let ConnectionState::Ready(existing) = &*state {
            return Ok(Arc::clone(existing));
        }
        match outcome {
            Ok(connection) => {
                tracing::info!(dependency = %self.name, "connection initialised");
                *state = ConnectionState::Ready(Arc::clone(&connection));
                Ok(connection)
            }
            Err(failure) => {
                *state = ConnectionState::FailedInit(failure.to_string());
                Err(failure)
            }
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        match &*self.lock() {
            ConnectionState::Uninitialized => ConnectionStatus::Uninitialized,
            ConnectionState::Ready(_) => ConnectionStatus::Ready,
            ConnectionState::FailedInit(_) => ConnectionStatus::FailedInit,
        }
    }

    /// Reason for the most recent failed initialisation
    pub fn last_error(&self) -> Option<String> {
        match &*self.lock() {
            ConnectionState::FailedInit(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    fn ready(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            ConnectionState::Ready(connection) => Some(Arc::clone(connection)),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: ?Sized + Send + Sync> std::fmt::Debug for LazyConnection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyConnection")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}
