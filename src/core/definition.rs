//! Declarative machine definitions.
//!
//! Definitions are plain data: they name states, transitions, and the
//! actions and guards to run, but hold no code. They can be written in
//! JSON and deserialized, or assembled with [`crate::builder::MachineBuilder`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target of a transition, with an optional guard.
///
/// In JSON a transition is either the bare target state name or a record
/// `{"target": ..., "cond": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transition {
    /// Unconditional transition to the named state
    Target(String),

    /// Transition allowed only when the named guard passes
    Guarded {
        target: String,
        #[serde(alias = "guard")]
        cond: String,
    },
}

impl Transition {
    /// Create a guarded transition.
    pub fn guarded(target: impl Into<String>, cond: impl Into<String>) -> Self {
        Transition::Guarded {
            target: target.into(),
            cond: cond.into(),
        }
    }

    /// The state this transition moves to.
    pub fn target(&self) -> &str {
        match self {
            Transition::Target(target) => target,
            Transition::Guarded { target, .. } => target,
        }
    }

    /// The guard name, if the transition is guarded.
    pub fn guard(&self) -> Option<&str> {
        match self {
            Transition::Target(_) => None,
            Transition::Guarded { cond, .. } => Some(cond),
        }
    }
}

impl From<&str> for Transition {
    fn from(target: &str) -> Self {
        Transition::Target(target.to_string())
    }
}

impl From<String> for Transition {
    fn from(target: String) -> Self {
        Transition::Target(target)
    }
}

/// A single state: its entry and exit actions and its outgoing transitions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Actions run, in order, after the machine enters this state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<String>,

    /// Actions run, in order, before the machine leaves this state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit: Vec<String>,

    /// Transitions keyed by (unscoped) event name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Transition>,
}

impl StateDefinition {
    /// The transition for `event`, if this state handles it.
    pub fn transition(&self, event: &str) -> Option<&Transition> {
        self.on.get(event)
    }
}

/// One independently tracked machine.
///
/// # Example
///
/// ```rust
/// use ministate::core::MachineDefinition;
/// use serde_json::json;
///
/// let definition: MachineDefinition = serde_json::from_value(json!({
///     "id": "searchBox",
///     "initial": "initial",
///     "states": {
///         "initial": { "on": { "INPUT": "searching" } },
///         "searching": { "entry": ["search"], "on": { "FETCHED": "success" } },
///         "success": {}
///     }
/// }))
/// .unwrap();
///
/// assert_eq!(definition.initial, "initial");
/// assert_eq!(definition.state("searching").unwrap().entry, vec!["search"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinition {
    /// Unique id, used for event scoping and as the snapshot key
    pub id: String,

    /// Name of the state the machine starts in
    pub initial: String,

    /// All states of this machine
    pub states: BTreeMap<String, StateDefinition>,
}

impl MachineDefinition {
    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<&StateDefinition> {
        self.states.get(name)
    }
}

/// One machine or many, as accepted in JSON configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(MachineDefinition),
    Many(Vec<MachineDefinition>),
}

impl From<OneOrMany> for Vec<MachineDefinition> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(definition) => vec![definition],
            OneOrMany::Many(definitions) => definitions,
        }
    }
}
