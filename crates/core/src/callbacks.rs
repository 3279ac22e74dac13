//! Transition hooks for circuit breaker state changes
//!
//! Hooks run after the breaker has released its state lock, so a hook may
//! safely read the breaker's state.

use std::sync::Arc;

type Hook = Arc<dyn Fn(&str) + Send + Sync>;

/// A state change observed while recording an outcome or admitting a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    HalfOpened,
    Closed,
}

#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_open: Option<Hook>,
    pub on_close: Option<Hook>,
    pub on_half_open: Option<Hook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self, circuit: &str, transition: Transition) {
        let hook = match transition {
            Transition::Opened => &self.on_open,
            Transition::HalfOpened => &self.on_half_open,
            Transition::Closed => &self.on_close,
        };
        if let Some(hook) = hook {
            hook(circuit);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .finish()
    }
}
