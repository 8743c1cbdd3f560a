//! Core configuration types.
//!
//! This module contains the data the runtime is driven by:
//! - Machine, state and transition definitions
//! - Events and their scoping rules
//! - Guard predicates
//!
//! Nothing in here holds runtime state; see [`crate::runtime`] for that.

mod definition;
mod event;
mod guard;

pub use definition::{MachineDefinition, StateDefinition, Transition};
pub use event::{Event, INIT_EVENT, SEPARATOR};
pub use guard::{Guard, GuardParams};

pub(crate) use definition::OneOrMany;

use std::collections::BTreeMap;

/// Shared data visible to every machine of one runtime.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Current state name of every machine, keyed by machine id.
pub type StateSnapshot = BTreeMap<String, String>;
