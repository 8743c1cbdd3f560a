//! Builder for complete runtime configurations.

use crate::builder::error::ConfigError;
use crate::core::{Context, Guard, GuardParams, MachineDefinition, OneOrMany};
use crate::runtime::{Action, ActionParams, MachineConfig};
use serde_json::Value;

/// Builder for [`MachineConfig`] with a fluent API.
///
/// `build` validates the definitions, so configurations produced here never
/// hit a dangling state reference at dispatch time.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    context: Option<Value>,
    config: MachineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial context. Must be a JSON object (or null for empty).
    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a machine. Machines are dispatched to in the order added.
    pub fn machine(mut self, definition: MachineDefinition) -> Self {
        self.config.machines.push(definition);
        self
    }

    /// Add machines from JSON: a single definition or an array of them.
    pub fn machines_json(mut self, json: &str) -> Result<Self, ConfigError> {
        let machines: OneOrMany = serde_json::from_str(json)?;
        self.config.machines.extend(Vec::from(machines));
        Ok(self)
    }

    /// Register an action under `name`.
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&ActionParams<'_>) + Send + Sync + 'static,
    {
        self.config.actions.insert(name.into(), Action::new(action));
        self
    }

    /// Register a guard under `name`.
    pub fn guard<F>(mut self, name: impl Into<String>, guard: F) -> Self
    where
        F: Fn(&GuardParams<'_>) -> bool + Send + Sync + 'static,
    {
        self.config.guards.insert(name.into(), Guard::new(guard));
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<MachineConfig, ConfigError> {
        let mut config = self.config;
        config.context = match self.context {
            None | Some(Value::Null) => Context::new(),
            Some(Value::Object(context)) => context,
            Some(_) => return Err(ConfigError::ContextNotObject),
        };

        config.validate()?;
        Ok(config)
    }
}
