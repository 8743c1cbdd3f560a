//! Entry/exit actions and the capabilities they are handed.

use super::error::DispatchError;
use super::machine::{Fault, Inner};
use crate::core::{Context, Event};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Side-effecting callback run when a machine enters or leaves a state.
///
/// # Example
///
/// ```rust
/// use ministate::runtime::{Action, ActionParams};
///
/// let set_query = Action::new(|params: &ActionParams<'_>| {
///     let query = params.data.and_then(|data| data.get("query")).cloned();
///     params.set_context([("query".to_string(), query.unwrap_or_default())]);
/// });
/// ```
#[derive(Clone)]
pub struct Action {
    callback: Arc<dyn Fn(&ActionParams<'_>) + Send + Sync>,
}

impl Action {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&ActionParams<'_>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, params: &ActionParams<'_>) {
        (self.callback)(params)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").finish_non_exhaustive()
    }
}

/// What an action sees and may do while it runs.
pub struct ActionParams<'a> {
    pub(crate) inner: &'a Arc<Inner>,
    pub(crate) fault: &'a Fault,
    /// Unscoped event name, or [`crate::core::INIT_EVENT`] at construction
    pub event_type: &'a str,
    /// Event payload, if any
    pub data: Option<&'a Value>,
    /// Context as it was when this action was invoked
    pub context: Context,
}

impl ActionParams<'_> {
    /// Dispatch an event re-entrantly.
    ///
    /// The nested dispatch runs to completion before this call returns.
    /// If it fails, the enclosing dispatch fails too once this action
    /// returns, whether or not the error is propagated here.
    pub fn send(&self, event: impl Into<Event>) -> Result<(), DispatchError> {
        self.inner.dispatch(&event.into(), self.fault)
    }

    /// Shallow-merge `partial` into the shared context and notify the
    /// context-change listener.
    pub fn set_context(&self, partial: impl IntoIterator<Item = (String, Value)>) {
        self.inner.set_context(partial)
    }

    /// An owned handle for work that outlives this invocation, such as a
    /// spawned task that sends an event when a fetch completes.
    pub fn handle(&self) -> ActionHandle {
        ActionHandle {
            inner: Arc::clone(self.inner),
        }
    }
}

impl fmt::Debug for ActionParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionParams")
            .field("event_type", &self.event_type)
            .field("data", &self.data)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Owned `send`/`set_context` capability for deferred work.
///
/// Calls made through a handle apply to whatever the state and context
/// are when they happen; the runtime never cancels pending work. Each
/// `send` is a dispatch of its own and does not affect the dispatch that
/// created the handle.
#[derive(Clone)]
pub struct ActionHandle {
    inner: Arc<Inner>,
}

impl ActionHandle {
    pub fn send(&self, event: impl Into<Event>) -> Result<(), DispatchError> {
        self.inner.send(event.into())
    }

    pub fn set_context(&self, partial: impl IntoIterator<Item = (String, Value)>) {
        self.inner.set_context(partial)
    }

    /// Current context.
    pub fn context(&self) -> Context {
        self.inner.context()
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandle")
            .field("instance", &self.inner.id)
            .finish_non_exhaustive()
    }
}
