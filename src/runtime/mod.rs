//! The machine runtime.
//!
//! This module owns everything that changes while machines run:
//! - The state snapshot and shared context
//! - The action table and the capabilities handed to actions
//! - Change listeners
//!
//! # Ordering
//!
//! For each machine a transition runs the source state's exit actions,
//! moves the snapshot, notifies the state-change listener, then runs the
//! target state's entry actions. `set_context` notifies the context-change
//! listener immediately, so a context change made by an exit action is
//! reported before the state change and one made by an entry action after
//! it.
//!
//! No lock is held while actions, guards or listeners run, so they may call
//! back into the runtime freely.

mod action;
mod config;
mod error;
mod listener;
mod machine;

pub use action::{Action, ActionHandle, ActionParams};
pub use config::MachineConfig;
pub use error::DispatchError;
pub use listener::{ContextListener, Listen, StateListener};
pub use machine::Machine;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Guarded data is plain state that is never left half-written, so a panic
// in user code while another frame held the lock does not invalidate it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
