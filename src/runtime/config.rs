//! Runtime configuration: machine definitions plus the code they refer to.

use super::action::Action;
use crate::builder::ConfigError;
use crate::core::{Context, Guard, MachineDefinition, SEPARATOR};
use std::collections::{HashMap, HashSet};

/// Everything a runtime is constructed from.
///
/// Definitions and guards are fixed once the runtime is built; actions can
/// be added or replaced later with [`crate::runtime::Machine::set_actions`].
#[derive(Clone, Debug, Default)]
pub struct MachineConfig {
    /// Initial shared context
    pub context: Context,
    /// Machines in dispatch order
    pub machines: Vec<MachineDefinition>,
    pub actions: HashMap<String, Action>,
    pub guards: HashMap<String, Guard>,
}

impl MachineConfig {
    /// Check the structural invariants of the definitions.
    ///
    /// [`crate::runtime::Machine::new`] does not call this; a configuration
    /// that breaks these rules fails, or silently misbehaves, at dispatch
    /// time instead. Action and guard names are not checked: actions may be
    /// registered after construction, and a missing guard lets its
    /// transition through.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.machines.is_empty() {
            return Err(ConfigError::NoMachines);
        }

        let mut seen = HashSet::new();
        for machine in &self.machines {
            if machine.id.contains(SEPARATOR) {
                return Err(ConfigError::InvalidMachineId {
                    id: machine.id.clone(),
                });
            }
            if !seen.insert(machine.id.as_str()) {
                return Err(ConfigError::DuplicateMachineId {
                    id: machine.id.clone(),
                });
            }
            if machine.state(&machine.initial).is_none() {
                return Err(ConfigError::UnknownInitialState {
                    machine: machine.id.clone(),
                    state: machine.initial.clone(),
                });
            }

            for (name, state) in &machine.states {
                for (event, transition) in &state.on {
                    if event.contains(SEPARATOR) {
                        return Err(ConfigError::InvalidEventName {
                            machine: machine.id.clone(),
                            event: event.clone(),
                        });
                    }
                    if machine.state(transition.target()).is_none() {
                        return Err(ConfigError::UnknownTarget {
                            machine: machine.id.clone(),
                            state: name.clone(),
                            event: event.clone(),
                            target: transition.target().to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl From<MachineDefinition> for MachineConfig {
    fn from(definition: MachineDefinition) -> Self {
        Self {
            machines: vec![definition],
            ..Self::default()
        }
    }
}

impl From<Vec<MachineDefinition>> for MachineConfig {
    fn from(machines: Vec<MachineDefinition>) -> Self {
        Self {
            machines,
            ..Self::default()
        }
    }
}
