//! Builder for a single state definition.

use crate::core::{StateDefinition, Transition};

/// Builder for state definitions with a fluent API.
#[derive(Clone, Debug, Default)]
pub struct StateBuilder {
    definition: StateDefinition,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry action.
    pub fn entry(mut self, action: impl Into<String>) -> Self {
        self.definition.entry.push(action.into());
        self
    }

    /// Append an exit action.
    pub fn exit(mut self, action: impl Into<String>) -> Self {
        self.definition.exit.push(action.into());
        self
    }

    /// Handle `event` with a transition. A later call for the same event
    /// replaces the earlier one.
    pub fn on(mut self, event: impl Into<String>, transition: impl Into<Transition>) -> Self {
        self.definition.on.insert(event.into(), transition.into());
        self
    }

    /// Handle `event` with a transition that fires only when `guard` passes.
    pub fn on_guarded(
        self,
        event: impl Into<String>,
        target: impl Into<String>,
        guard: impl Into<String>,
    ) -> Self {
        self.on(event, Transition::guarded(target, guard))
    }

    pub fn build(self) -> StateDefinition {
        self.definition
    }
}
