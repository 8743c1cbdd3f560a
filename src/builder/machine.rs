//! Builder for machine definitions.

use crate::builder::error::ConfigError;
use crate::builder::state::StateBuilder;
use crate::core::{MachineDefinition, StateDefinition};
use std::collections::BTreeMap;

/// Builder for constructing machine definitions with a fluent API.
#[derive(Clone, Debug)]
pub struct MachineBuilder {
    id: String,
    initial: Option<String>,
    states: BTreeMap<String, StateDefinition>,
}

impl MachineBuilder {
    /// Create a builder for the machine with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial: None,
            states: BTreeMap::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Add a state. Adding a state twice replaces the earlier definition.
    pub fn state(mut self, name: impl Into<String>, state: StateBuilder) -> Self {
        self.states.insert(name.into(), state.build());
        self
    }

    /// Build the definition.
    ///
    /// Only the initial state is required here; cross-references are
    /// checked by [`crate::runtime::MachineConfig::validate`].
    pub fn build(self) -> Result<MachineDefinition, ConfigError> {
        let initial = self.initial.ok_or_else(|| ConfigError::MissingInitialState {
            machine: self.id.clone(),
        })?;

        Ok(MachineDefinition {
            id: self.id,
            initial,
            states: self.states,
        })
    }
}
