//! Change listeners.
//!
//! A runtime has exactly one slot for a state-change listener and one for a
//! context-change listener. Registering replaces the previous listener;
//! registering `None` clears the slot.

use super::lock;
use crate::core::{Context, StateSnapshot};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Called with `(new snapshot, snapshot before the transition)`.
#[derive(Clone)]
pub struct StateListener {
    callback: Arc<dyn Fn(&StateSnapshot, &StateSnapshot) + Send + Sync>,
}

impl StateListener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&StateSnapshot, &StateSnapshot) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for StateListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateListener").finish_non_exhaustive()
    }
}

/// Called with `(new context, context before the merge)`.
#[derive(Clone)]
pub struct ContextListener {
    callback: Arc<dyn Fn(&Context, &Context) + Send + Sync>,
}

impl ContextListener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Context, &Context) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for ContextListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextListener").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    state: Mutex<Option<StateListener>>,
    context: Mutex<Option<ContextListener>>,
}

impl Listeners {
    // The slot lock is released before the callback runs, so a listener
    // may itself send events or re-register.
    pub(crate) fn notify_state(&self, next: &StateSnapshot, prev: &StateSnapshot) {
        let listener = lock(&self.state).clone();
        if let Some(listener) = listener {
            (listener.callback)(next, prev);
        }
    }

    pub(crate) fn notify_context(&self, next: &Context, prev: &Context) {
        let listener = lock(&self.context).clone();
        if let Some(listener) = listener {
            (listener.callback)(next, prev);
        }
    }
}

/// Registration interface returned by [`crate::runtime::Machine::listen`].
pub struct Listen<'a> {
    pub(crate) listeners: &'a Listeners,
}

impl Listen<'_> {
    /// Register the state-change listener, or clear it with `None`.
    pub fn on_state_change(&self, listener: Option<StateListener>) {
        *lock(&self.listeners.state) = listener;
    }

    /// Register the context-change listener, or clear it with `None`.
    pub fn on_context_change(&self, listener: Option<ContextListener>) {
        *lock(&self.listeners.context) = listener;
    }
}
