//! Configuration errors raised by builders and validation.

use thiserror::Error;

/// Errors that can occur when building or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Initial state not specified for machine '{machine}'. Call .initial(state) before .build()")]
    MissingInitialState { machine: String },

    #[error("No machines defined. Add at least one machine")]
    NoMachines,

    #[error("Machine id '{id}' is used more than once")]
    DuplicateMachineId { id: String },

    #[error("Machine id '{id}' contains the scope separator")]
    InvalidMachineId { id: String },

    #[error("Event name '{event}' in machine '{machine}' contains the scope separator")]
    InvalidEventName { machine: String, event: String },

    #[error("Initial state '{state}' of machine '{machine}' is not defined")]
    UnknownInitialState { machine: String, state: String },

    #[error("Transition '{event}' from '{machine}.{state}' targets undefined state '{target}'")]
    UnknownTarget {
        machine: String,
        state: String,
        event: String,
        target: String,
    },

    #[error("Context must be a JSON object")]
    ContextNotObject,

    #[error("Invalid machine definition: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
