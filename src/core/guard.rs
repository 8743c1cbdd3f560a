//! Guard predicates for controlling transitions.
//!
//! Guards are boolean functions that decide whether a guarded transition
//! fires. They see the shared context, the full state snapshot and the
//! event, and must not have side effects.

use super::{Context, StateSnapshot};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Everything a guard can inspect when deciding on a transition.
#[derive(Clone, Copy, Debug)]
pub struct GuardParams<'a> {
    /// Shared context at evaluation time
    pub context: &'a Context,
    /// Full state snapshot at evaluation time
    pub state: &'a StateSnapshot,
    /// Unscoped event name
    pub event_type: &'a str,
    /// Event payload, if any
    pub data: Option<&'a Value>,
}

/// Named predicate that determines if a guarded transition fires.
///
/// # Example
///
/// ```rust
/// use ministate::core::{Context, Guard, GuardParams, StateSnapshot};
/// use serde_json::json;
///
/// let has_hits = Guard::new(|params: &GuardParams<'_>| {
///     params.context["hits"].as_array().is_some_and(|hits| !hits.is_empty())
/// });
///
/// let mut context = Context::new();
/// context.insert("hits".to_string(), json!(["Apple iPhone XR"]));
/// let state = StateSnapshot::new();
///
/// assert!(has_hits.check(&GuardParams {
///     context: &context,
///     state: &state,
///     event_type: "HIGHLIGHT_NEXT",
///     data: None,
/// }));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<dyn Fn(&GuardParams<'_>) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a predicate function.
    ///
    /// The predicate should be pure (deterministic, no side effects) and
    /// thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&GuardParams<'_>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard.
    pub fn check(&self, params: &GuardParams<'_>) -> bool {
        (self.predicate)(params)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
