//! Ministate: a minimal multi-machine state chart runtime.
//!
//! Several independently evolving machines share one mutable context.
//! Named events move machines between states; entry and exit actions run
//! side effects and merge changes into the context; guards decide whether
//! a transition fires; listeners observe state and context changes.
//!
//! # Core Concepts
//!
//! - **Definitions**: Declarative machines, states and transitions (`core`)
//! - **Runtime**: Event dispatch, actions and listeners (`runtime`)
//! - **Builders**: Fluent and JSON-driven configuration (`builder`)
//!
//! # Events
//!
//! `"INPUT"` goes to every machine; `"searchBox.INPUT"` goes only to the
//! machine with id `searchBox`.
//!
//! # Example
//!
//! ```rust
//! use ministate::builder::ConfigBuilder;
//! use ministate::core::Event;
//! use ministate::runtime::{ActionParams, Machine};
//! use serde_json::json;
//!
//! let config = ConfigBuilder::new()
//!     .context(json!({ "query": null }))
//!     .machines_json(r#"{
//!         "id": "searchBox",
//!         "initial": "initial",
//!         "states": {
//!             "initial": { "on": { "INPUT": "searching" } },
//!             "searching": { "entry": ["setQuery"], "on": { "INPUT": "searching" } }
//!         }
//!     }"#)
//!     .unwrap()
//!     .action("setQuery", |params: &ActionParams<'_>| {
//!         let query = params.data.map(|data| data["query"].clone()).unwrap_or_default();
//!         params.set_context([("query".to_string(), query)]);
//!     })
//!     .build()
//!     .unwrap();
//!
//! let machine = Machine::new(config).unwrap();
//! machine.send(Event::with_data("INPUT", json!({ "query": "hello" }))).unwrap();
//!
//! assert_eq!(machine.state()["searchBox"], "searching");
//! assert_eq!(machine.context()["query"], json!("hello"));
//! ```

pub mod builder;
pub mod core;
pub mod runtime;

// Re-export commonly used types
pub use crate::builder::{ConfigBuilder, ConfigError, MachineBuilder, StateBuilder};
pub use crate::core::{Event, MachineDefinition, Transition};
pub use crate::runtime::{Action, ActionParams, DispatchError, Machine, MachineConfig};
