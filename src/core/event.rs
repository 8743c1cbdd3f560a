//! Events dispatched to machines.
//!
//! An event is a name, optionally carrying a JSON payload. A name of the
//! form `machineId.EVENT` is scoped to the machine with that id; any other
//! name is broadcast to every machine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between a machine id and an event name in a scoped event.
pub const SEPARATOR: char = '.';

/// Event type passed to entry actions of the initial states at construction.
///
/// It contains [`SEPARATOR`], so it can never be the name of a user event.
pub const INIT_EVENT: &str = "ministate.init";

/// An event sent to a machine runtime.
///
/// In JSON an event is either a bare string or `{"type": ..., "data": ...}`.
///
/// # Example
///
/// ```rust
/// use ministate::core::Event;
/// use serde_json::json;
///
/// let plain: Event = "INPUT".into();
/// assert_eq!(plain.name(), "INPUT");
/// assert!(plain.data().is_none());
///
/// let with_data = Event::with_data("searchBox.INPUT", json!({ "query": "hello" }));
/// let (scope, name) = with_data.split();
/// assert_eq!(scope, Some("searchBox"));
/// assert_eq!(name, "INPUT");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    /// An event without payload
    Name(String),

    /// An event carrying a payload
    WithData {
        #[serde(rename = "type")]
        name: String,
        #[serde(default)]
        data: Value,
    },
}

impl Event {
    /// Create an event carrying `data`.
    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Event::WithData {
            name: name.into(),
            data,
        }
    }

    /// The raw event name, including any scope prefix.
    pub fn name(&self) -> &str {
        match self {
            Event::Name(name) => name,
            Event::WithData { name, .. } => name,
        }
    }

    /// The payload, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Event::Name(_) => None,
            Event::WithData { data, .. } => Some(data),
        }
    }

    /// Split the raw name into `(scope, event name)`.
    ///
    /// The scope is everything before the first separator; the event name
    /// is the remainder. Unscoped events return `None` as scope.
    pub fn split(&self) -> (Option<&str>, &str) {
        split_scope(self.name())
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::Name(name.to_string())
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::Name(name)
    }
}

/// Split a raw event name on the first [`SEPARATOR`].
fn split_scope(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(SEPARATOR) {
        Some((scope, name)) => (Some(scope), name),
        None => (None, raw),
    }
}
