//! Dispatch error types.

use thiserror::Error;

/// Errors that abort an in-flight dispatch.
///
/// A dispatch that fails stops where it is: actions that already ran and
/// state changes already made are kept. The error travels through every
/// enclosing re-entrant `send` up to the outermost call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Action '{name}' is not registered")]
    UnknownAction { name: String },

    #[error("Machine '{machine}' has no state named '{state}'")]
    UnknownState { machine: String, state: String },
}
