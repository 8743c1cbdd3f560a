//! Builder API for ergonomic configuration.
//!
//! This module provides fluent builders for states, machines and whole
//! runtime configurations, and the validation error they report.

pub mod config;
pub mod error;
pub mod machine;
pub mod state;

pub use config::ConfigBuilder;
pub use error::ConfigError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
