//! Retry classification for canonical errors
//!
//! The executor never inspects errors itself. It asks a [`RetryClassifier`]
//! for a [`Disposition`] and loops on the answer.

use crate::fault::{CanonicalError, ErrorCode};

/// Whether a failed attempt may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retryable,
    Terminal,
}

/// Decides the retry disposition of a failed attempt
///
/// # Examples
///
/// ```rust
/// use registrar_breaker::{CanonicalError, Disposition, RetryClassifier};
///
/// #[derive(Debug)]
/// struct NeverRetry;
///
/// impl RetryClassifier for NeverRetry {
///     fn classify(&self, _error: &CanonicalError) -> Disposition {
///         Disposition::Terminal
///     }
/// }
///
/// let error = CanonicalError::communication("down");
/// assert_eq!(NeverRetry.classify(&error), Disposition::Terminal);
/// ```
pub trait RetryClassifier: Send + Sync + std::fmt::Debug {
    fn classify(&self, error: &CanonicalError) -> Disposition;
}

/// Client faults (4xx except 408) are terminal, server and transport
/// faults are retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl RetryClassifier for DefaultClassifier {
    fn classify(&self, error: &CanonicalError) -> Disposition {
        match error.code() {
            ErrorCode::CommunicationError if is_client_fault(error.status_code()) => {
                Disposition::Terminal
            }
            ErrorCode::CommunicationError => Disposition::Retryable,
            ErrorCode::Other(_) if is_retryable_status(error.status_code()) => {
                Disposition::Retryable
            }
            ErrorCode::Other(_)
            | ErrorCode::CircuitOpen
            | ErrorCode::AuthRequired
            | ErrorCode::NotFound
            | ErrorCode::RemoteFault
            | ErrorCode::UnknownError => Disposition::Terminal,
        }
    }
}

fn is_client_fault(status: u16) -> bool {
    (400..500).contains(&status) && status != 408
}

fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408
}

/// Classifier backed by a closure
pub struct PredicateClassifier<F>
where
    F: Fn(&CanonicalError) -> Disposition + Send + Sync,
{
    predicate: F,
}

impl<F> PredicateClassifier<F>
where
    F: Fn(&CanonicalError) -> Disposition + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> RetryClassifier for PredicateClassifier<F>
where
    F: Fn(&CanonicalError) -> Disposition + Send + Sync,
{
    fn classify(&self, error: &CanonicalError) -> Disposition {
        (self.predicate)(error)
    }
}

impl<F> std::fmt::Debug for PredicateClassifier<F>
where
    F: Fn(&CanonicalError) -> Disposition + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateClassifier")
            .field("predicate", &"<closure>")
            .finish()
    }
}
