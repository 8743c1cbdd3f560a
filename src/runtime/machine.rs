//! The machine runtime: event dispatch, guards, actions and notification.

use super::action::{Action, ActionParams};
use super::config::MachineConfig;
use super::error::DispatchError;
use super::listener::{Listen, Listeners};
use super::lock;
use crate::core::{
    Context, Event, Guard, GuardParams, MachineDefinition, StateDefinition, StateSnapshot,
    INIT_EVENT,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Handle to one running set of machines.
///
/// Cloning the handle shares the same runtime. All state lives in the
/// runtime instance; separate instances share nothing.
///
/// Dispatch is synchronous and re-entrant: an action that calls `send`
/// runs the nested dispatch to completion before the next action in its
/// list. Recursion depth is not limited, so an entry action that
/// unconditionally re-enters its own state overflows the stack.
///
/// A failure anywhere in a dispatch chain (an outer `send` plus every
/// nested [`ActionParams::send`] below it) fails the outer `send`, even if
/// an action drops the nested result. Sends made through a `Machine` or an
/// [`ActionHandle`](super::ActionHandle), including from inside a listener
/// or action, start a chain of their own and report only their own result.
///
/// # Example
///
/// ```rust
/// use ministate::builder::{ConfigBuilder, MachineBuilder, StateBuilder};
/// use ministate::runtime::Machine;
///
/// let search_box = MachineBuilder::new("searchBox")
///     .initial("initial")
///     .state("initial", StateBuilder::new().on("INPUT", "searching"))
///     .state("searching", StateBuilder::new().on("FETCHED", "success"))
///     .state("success", StateBuilder::new().on("INPUT", "searching"))
///     .build()
///     .unwrap();
///
/// let config = ConfigBuilder::new().machine(search_box).build().unwrap();
/// let machine = Machine::new(config).unwrap();
///
/// machine.send("INPUT").unwrap();
/// assert_eq!(machine.state()["searchBox"], "searching");
///
/// machine.send("searchBox.FETCHED").unwrap();
/// assert_eq!(machine.state()["searchBox"], "success");
/// ```
#[derive(Clone)]
pub struct Machine {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) id: Uuid,
    machines: Vec<MachineDefinition>,
    guards: HashMap<String, Guard>,
    actions: Mutex<HashMap<String, Action>>,
    state: Mutex<StateSnapshot>,
    context: Mutex<Context>,
    listeners: Listeners,
}

/// First failure recorded by one dispatch chain.
#[derive(Debug, Default)]
pub(crate) struct Fault {
    slot: Mutex<Option<DispatchError>>,
}

impl Fault {
    fn fail(&self, error: DispatchError) -> DispatchError {
        lock(&self.slot).get_or_insert_with(|| error.clone());
        error
    }

    fn check(&self) -> Result<(), DispatchError> {
        match lock(&self.slot).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Machine {
    /// Build a runtime and run the entry actions of every initial state.
    ///
    /// The configuration is not validated here; call
    /// [`MachineConfig::validate`] (or build it with
    /// [`crate::builder::ConfigBuilder`]) to reject broken definitions up
    /// front.
    pub fn new(config: MachineConfig) -> Result<Self, DispatchError> {
        let MachineConfig {
            context,
            machines,
            actions,
            guards,
        } = config;

        let state: StateSnapshot = machines
            .iter()
            .map(|machine| (machine.id.clone(), machine.initial.clone()))
            .collect();

        let inner = Arc::new(Inner {
            id: Uuid::new_v4(),
            machines,
            guards,
            actions: Mutex::new(actions),
            state: Mutex::new(state),
            context: Mutex::new(context),
            listeners: Listeners::default(),
        });

        debug!(instance = %inner.id, machines = inner.machines.len(), "starting machines");
        inner.enter_initial_states(&Fault::default())?;

        Ok(Self { inner })
    }

    /// Dispatch an event.
    ///
    /// An event no machine handles is not an error: nothing changes and no
    /// listener fires.
    pub fn send(&self, event: impl Into<Event>) -> Result<(), DispatchError> {
        self.inner.send(event.into())
    }

    /// Current state of every machine.
    pub fn state(&self) -> StateSnapshot {
        self.inner.state()
    }

    /// Current shared context.
    pub fn context(&self) -> Context {
        self.inner.context()
    }

    /// Add or replace actions. Takes effect for subsequent invocations only.
    pub fn set_actions<I, K>(&self, actions: I)
    where
        I: IntoIterator<Item = (K, Action)>,
        K: Into<String>,
    {
        let mut table = lock(&self.inner.actions);
        for (name, action) in actions {
            table.insert(name.into(), action);
        }
    }

    /// Register or clear change listeners.
    pub fn listen(&self) -> Listen<'_> {
        Listen {
            listeners: &self.inner.listeners,
        }
    }

    /// Identifier of this runtime instance, as recorded in log events.
    pub fn instance_id(&self) -> Uuid {
        self.inner.id
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("instance", &self.inner.id)
            .field("state", &self.inner.state())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Dispatch `event` as the start of a new chain.
    pub(crate) fn send(self: &Arc<Self>, event: Event) -> Result<(), DispatchError> {
        self.dispatch(&event, &Fault::default())
    }

    pub(crate) fn state(&self) -> StateSnapshot {
        lock(&self.state).clone()
    }

    pub(crate) fn context(&self) -> Context {
        lock(&self.context).clone()
    }

    pub(crate) fn set_context(&self, partial: impl IntoIterator<Item = (String, Value)>) {
        let (next, prev) = {
            let mut context = lock(&self.context);
            let prev = context.clone();
            for (key, value) in partial {
                context.insert(key, value);
            }
            (context.clone(), prev)
        };

        trace!(instance = %self.id, "context updated");
        self.listeners.notify_context(&next, &prev);
    }

    fn enter_initial_states(self: &Arc<Self>, fault: &Fault) -> Result<(), DispatchError> {
        for machine in &self.machines {
            let initial = self.definition_of(machine, &machine.initial, fault)?;
            self.run_actions(&initial.entry, INIT_EVENT, None, fault)?;
        }
        Ok(())
    }

    pub(crate) fn dispatch(
        self: &Arc<Self>,
        event: &Event,
        fault: &Fault,
    ) -> Result<(), DispatchError> {
        let (scope, name) = event.split();
        let data = event.data();

        for machine in &self.machines {
            if scope.is_some_and(|scope| scope != machine.id) {
                continue;
            }
            self.step(machine, name, data, fault)?;
        }

        Ok(())
    }

    /// Try to move one machine on `event_type`.
    fn step(
        self: &Arc<Self>,
        machine: &MachineDefinition,
        event_type: &str,
        data: Option<&Value>,
        fault: &Fault,
    ) -> Result<(), DispatchError> {
        let current = self.current_state_of(machine);
        let source = self.definition_of(machine, &current, fault)?;

        let Some(transition) = source.transition(event_type) else {
            trace!(instance = %self.id, machine = %machine.id, state = %current, event = event_type, "event not handled");
            return Ok(());
        };

        if let Some(guard_name) = transition.guard() {
            match self.guards.get(guard_name) {
                Some(guard) => {
                    let context = self.context();
                    let state = self.state();
                    let allowed = guard.check(&GuardParams {
                        context: &context,
                        state: &state,
                        event_type,
                        data,
                    });
                    if !allowed {
                        trace!(instance = %self.id, machine = %machine.id, guard = guard_name, "guard blocked transition");
                        return Ok(());
                    }
                }
                None => {
                    // Unknown guards let the transition through.
                    warn!(instance = %self.id, machine = %machine.id, guard = guard_name, "guard is not registered, treating transition as unguarded");
                }
            }
        }

        self.run_actions(&source.exit, event_type, data, fault)?;

        let target = transition.target();
        let (next, prev) = {
            let mut state = lock(&self.state);
            let prev = state.clone();
            state.insert(machine.id.clone(), target.to_string());
            (state.clone(), prev)
        };
        debug!(instance = %self.id, machine = %machine.id, from = %current, to = target, event = event_type, "transition");
        self.listeners.notify_state(&next, &prev);

        let destination = self.definition_of(machine, target, fault)?;
        self.run_actions(&destination.entry, event_type, data, fault)
    }

    fn run_actions(
        self: &Arc<Self>,
        names: &[String],
        event_type: &str,
        data: Option<&Value>,
        fault: &Fault,
    ) -> Result<(), DispatchError> {
        for name in names {
            let action = lock(&self.actions).get(name).cloned();
            let Some(action) = action else {
                warn!(instance = %self.id, action = %name, event = event_type, "action is not registered, aborting dispatch");
                return Err(fault.fail(DispatchError::UnknownAction { name: name.clone() }));
            };

            action.invoke(&ActionParams {
                inner: self,
                event_type,
                data,
                context: self.context(),
                fault,
            });

            // A nested send inside the action may have failed even if the
            // action dropped its result.
            fault.check()?;
        }
        Ok(())
    }

    fn current_state_of(&self, machine: &MachineDefinition) -> String {
        lock(&self.state)
            .get(&machine.id)
            .cloned()
            .unwrap_or_else(|| machine.initial.clone())
    }

    fn definition_of<'m>(
        &self,
        machine: &'m MachineDefinition,
        state: &str,
        fault: &Fault,
    ) -> Result<&'m StateDefinition, DispatchError> {
        machine.state(state).ok_or_else(|| {
            fault.fail(DispatchError::UnknownState {
                machine: machine.id.clone(),
                state: state.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ConfigBuilder, MachineBuilder, StateBuilder};
    use crate::core::Transition;
    use crate::runtime::{ContextListener, StateListener};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    fn search_box(id: &str) -> MachineDefinition {
        MachineBuilder::new(id)
            .initial("initial")
            .state("initial", StateBuilder::new().on("INPUT", "searching"))
            .state(
                "searching",
                StateBuilder::new()
                    .on("FETCHED", "success")
                    .on("INPUT", "searching")
                    .on("RESET_SEARCH", "initial"),
            )
            .state(
                "success",
                StateBuilder::new()
                    .on("INPUT", "searching")
                    .on("RESET_SEARCH", "initial"),
            )
            .build()
            .unwrap()
    }

    fn snapshot(pairs: &[(&str, &str)]) -> StateSnapshot {
        pairs
            .iter()
            .map(|(id, state)| (id.to_string(), state.to_string()))
            .collect()
    }

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        entry: &str,
    ) -> impl Fn(&ActionParams<'_>) + Send + Sync + 'static {
        let log = Arc::clone(log);
        let entry = entry.to_string();
        move |_: &ActionParams<'_>| log.lock().unwrap().push(entry.clone())
    }

    #[test]
    fn starts_in_initial_state() {
        let machine = Machine::new(MachineConfig::from(search_box("searchBox"))).unwrap();
        assert_eq!(machine.state(), snapshot(&[("searchBox", "initial")]));
    }

    #[test]
    fn send_changes_state() {
        let machine = Machine::new(MachineConfig::from(search_box("searchBox"))).unwrap();
        machine.send("INPUT").unwrap();
        assert_eq!(machine.state(), snapshot(&[("searchBox", "searching")]));
    }

    #[test]
    fn unknown_event_is_a_silent_no_op() {
        let machine = Machine::new(MachineConfig::from(search_box("searchBox"))).unwrap();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |_, _| {
                flag.store(true, Ordering::SeqCst);
            })));

        machine.send("UNKNOWN").unwrap();

        assert_eq!(machine.state(), snapshot(&[("searchBox", "initial")]));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn unscoped_event_moves_every_machine() {
        let config = MachineConfig::from(vec![search_box("a"), search_box("b")]);
        let machine = Machine::new(config).unwrap();

        machine.send("INPUT").unwrap();

        assert_eq!(
            machine.state(),
            snapshot(&[("a", "searching"), ("b", "searching")])
        );
    }

    #[test]
    fn scoped_event_moves_only_named_machine() {
        let config = MachineConfig::from(vec![search_box("a"), search_box("b")]);
        let machine = Machine::new(config).unwrap();

        machine.send("b.INPUT").unwrap();

        assert_eq!(
            machine.state(),
            snapshot(&[("a", "initial"), ("b", "searching")])
        );
    }

    #[test]
    fn scope_naming_unknown_machine_does_nothing() {
        let machine = Machine::new(MachineConfig::from(search_box("a"))).unwrap();
        machine.send("zzz.INPUT").unwrap();
        assert_eq!(machine.state(), snapshot(&[("a", "initial")]));
    }

    #[test]
    fn state_listener_receives_previous_snapshot_per_machine() {
        let config = MachineConfig::from(vec![search_box("a"), search_box("b")]);
        let machine = Machine::new(config).unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |next, prev| {
                seen.lock().unwrap().push((next.clone(), prev.clone()));
            })));

        machine.send("INPUT").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, snapshot(&[("a", "initial"), ("b", "initial")]));
        assert_eq!(calls[0].0, snapshot(&[("a", "searching"), ("b", "initial")]));
        assert_eq!(calls[1].1, snapshot(&[("a", "searching"), ("b", "initial")]));
        assert_eq!(
            calls[1].0,
            snapshot(&[("a", "searching"), ("b", "searching")])
        );
    }

    #[test]
    fn exit_runs_before_state_change_and_entry_after() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = MachineBuilder::new("m")
            .initial("idle")
            .state(
                "idle",
                StateBuilder::new().exit("leaveIdle").on("GO", "busy"),
            )
            .state("busy", StateBuilder::new().entry("enterBusy"))
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .machine(definition)
            .action("leaveIdle", recorder(&log, "exit"))
            .action("enterBusy", recorder(&log, "entry"))
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        let listener_log = Arc::clone(&log);
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |_, _| {
                listener_log.lock().unwrap().push("state".to_string());
            })));

        machine.send("GO").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["exit", "state", "entry"]);
    }

    #[test]
    fn guard_blocks_and_allows() {
        let allow = Arc::new(AtomicBool::new(false));
        let entered = Arc::new(AtomicUsize::new(0));
        let definition = MachineBuilder::new("highlight")
            .initial("none")
            .state(
                "none",
                StateBuilder::new().on(
                    "HIGHLIGHT_NEXT",
                    Transition::guarded("highlighted", "hasHits"),
                ),
            )
            .state("highlighted", StateBuilder::new().entry("mark"))
            .build()
            .unwrap();

        let gate = Arc::clone(&allow);
        let counter = Arc::clone(&entered);
        let config = ConfigBuilder::new()
            .machine(definition)
            .guard("hasHits", move |_: &GuardParams<'_>| gate.load(Ordering::SeqCst))
            .action("mark", move |_: &ActionParams<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        machine.send("HIGHLIGHT_NEXT").unwrap();
        assert_eq!(machine.state(), snapshot(&[("highlight", "none")]));
        assert_eq!(entered.load(Ordering::SeqCst), 0);

        allow.store(true, Ordering::SeqCst);
        machine.send("HIGHLIGHT_NEXT").unwrap();
        assert_eq!(machine.state(), snapshot(&[("highlight", "highlighted")]));
        assert_eq!(entered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_guard_lets_transition_through() {
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", Transition::guarded("b", "nope")))
            .state("b", StateBuilder::new())
            .build()
            .unwrap();
        let machine = Machine::new(MachineConfig::from(definition)).unwrap();

        machine.send("GO").unwrap();

        assert_eq!(machine.state(), snapshot(&[("m", "b")]));
    }

    #[test]
    fn guard_sees_event_and_snapshot() {
        let seen = Arc::new(Mutex::new(None));
        let record = Arc::clone(&seen);
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", Transition::guarded("b", "check")))
            .state("b", StateBuilder::new())
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .machine(definition)
            .guard("check", move |p: &GuardParams<'_>| {
                *record.lock().unwrap() = Some((
                    p.event_type.to_string(),
                    p.data.cloned(),
                    p.state.clone(),
                ));
                true
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        machine
            .send(Event::with_data("m.GO", json!({ "n": 1 })))
            .unwrap();

        let (event_type, data, state) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(event_type, "GO");
        assert_eq!(data, Some(json!({ "n": 1 })));
        assert_eq!(state, snapshot(&[("m", "a")]));
    }

    #[test]
    fn entry_context_change_is_notified_after_state_change() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = MachineBuilder::new("searchBox")
            .initial("initial")
            .state("initial", StateBuilder::new().on("INPUT", "searching"))
            .state("searching", StateBuilder::new().entry("setQuery"))
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .context(json!({ "query": null }))
            .machine(definition)
            .action("setQuery", |p: &ActionParams<'_>| {
                let query = p.data.map(|d| d["query"].clone()).unwrap_or_default();
                p.set_context([("query".to_string(), query)]);
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        let state_log = Arc::clone(&log);
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |_, _| {
                state_log.lock().unwrap().push("state".to_string());
            })));
        let context_log = Arc::clone(&log);
        machine
            .listen()
            .on_context_change(Some(ContextListener::new(move |next, _| {
                context_log
                    .lock()
                    .unwrap()
                    .push(format!("context:{}", next["query"]));
            })));

        machine
            .send(Event::with_data("INPUT", json!({ "query": "hello" })))
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["state".to_string(), "context:\"hello\"".to_string()]
        );
        assert_eq!(machine.context()["query"], json!("hello"));
    }

    #[test]
    fn exit_context_change_is_notified_before_state_change() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().exit("clear").on("GO", "b"))
            .state("b", StateBuilder::new())
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .machine(definition)
            .action("clear", |p: &ActionParams<'_>| {
                p.set_context([("cleared".to_string(), json!(true))]);
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        let state_log = Arc::clone(&log);
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |_, _| {
                state_log.lock().unwrap().push("state");
            })));
        let context_log = Arc::clone(&log);
        machine
            .listen()
            .on_context_change(Some(ContextListener::new(move |_, _| {
                context_log.lock().unwrap().push("context");
            })));

        machine.send("GO").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["context", "state"]);
    }

    #[test]
    fn each_set_context_call_notifies() {
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().entry("twice"))
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .machine(definition)
            .action("twice", |p: &ActionParams<'_>| {
                p.set_context([("x".to_string(), json!(1))]);
                p.set_context([("y".to_string(), json!(2))]);
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        machine
            .listen()
            .on_context_change(Some(ContextListener::new(move |next, prev| {
                seen.lock().unwrap().push((prev.len(), next.len()));
            })));

        machine.send("GO").unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn reentrant_send_settles_before_outer_send_returns() {
        let mut definition = search_box("searchBox");
        definition
            .states
            .get_mut("searching")
            .unwrap()
            .entry
            .push("search".to_string());
        let config = ConfigBuilder::new()
            .machine(definition)
            .action("search", |p: &ActionParams<'_>| {
                p.send("FETCHED").unwrap();
            })
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        machine.send("INPUT").unwrap();

        assert_eq!(machine.state(), snapshot(&[("searchBox", "success")]));
    }

    #[test]
    fn unknown_action_aborts_dispatch() {
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().entry("missing"))
            .build()
            .unwrap();
        let machine = Machine::new(MachineConfig::from(definition)).unwrap();

        let error = machine.send("GO").unwrap_err();

        assert_eq!(
            error,
            DispatchError::UnknownAction {
                name: "missing".to_string()
            }
        );
        // The snapshot moved before the entry action was looked up.
        assert_eq!(machine.state(), snapshot(&[("m", "b")]));
    }

    #[test]
    fn nested_failure_aborts_outer_dispatch_even_when_ignored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().entry("forward").entry("after").on("NEXT", "c"))
            .state("c", StateBuilder::new().entry("missing"))
            .build()
            .unwrap();
        let config = ConfigBuilder::new()
            .machine(definition)
            .action("forward", |p: &ActionParams<'_>| {
                let _ = p.send("NEXT");
            })
            .action("after", recorder(&log, "after"))
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        let result = machine.send("GO");

        assert!(matches!(result, Err(DispatchError::UnknownAction { name }) if name == "missing"));
        assert!(log.lock().unwrap().is_empty());

        // The fault does not leak into later dispatches.
        machine.send("UNHANDLED").unwrap();
    }

    #[test]
    fn failure_on_another_thread_does_not_leak_into_this_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = MachineBuilder::new("m1")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().entry("wait").entry("after"))
            .build()
            .unwrap();
        let second = MachineBuilder::new("m2")
            .initial("a")
            .state("a", StateBuilder::new().on("BREAK", "b"))
            .state("b", StateBuilder::new().entry("missing"))
            .build()
            .unwrap();

        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let done_rx = Mutex::new(done_rx);
        let config = ConfigBuilder::new()
            .machine(first)
            .machine(second)
            .action("wait", move |_: &ActionParams<'_>| {
                started_tx.lock().unwrap().send(()).unwrap();
                done_rx.lock().unwrap().recv().unwrap();
            })
            .action("after", recorder(&log, "after"))
            .build()
            .unwrap();
        let machine = Machine::new(config).unwrap();

        let other = machine.clone();
        let breaker = thread::spawn(move || {
            started_rx.recv().unwrap();
            let result = other.send("m2.BREAK");
            done_tx.send(()).unwrap();
            result
        });

        let result = machine.send("m1.GO");
        let other_result = breaker.join().unwrap();

        assert_eq!(result, Ok(()));
        assert!(
            matches!(other_result, Err(DispatchError::UnknownAction { name }) if name == "missing")
        );
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
        assert_eq!(machine.state(), snapshot(&[("m1", "b"), ("m2", "b")]));
    }

    #[test]
    fn send_from_listener_reports_its_own_result() {
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().on("BREAK", "c"))
            .state("c", StateBuilder::new().entry("missing"))
            .build()
            .unwrap();
        let machine = Machine::new(MachineConfig::from(definition)).unwrap();

        let nested = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&nested);
        let handle = machine.clone();
        machine
            .listen()
            .on_state_change(Some(StateListener::new(move |next, _| {
                if next["m"] == "b" {
                    let result = handle.send("BREAK");
                    *seen.lock().unwrap() = Some(result);
                }
            })));

        let outer = machine.send("GO");

        assert_eq!(outer, Ok(()));
        assert_eq!(
            *nested.lock().unwrap(),
            Some(Err(DispatchError::UnknownAction {
                name: "missing".to_string()
            }))
        );
        assert_eq!(machine.state(), snapshot(&[("m", "c")]));
    }

    #[test]
    fn unknown_action_in_initial_state_fails_construction() {
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().entry("missing"))
            .build()
            .unwrap();
        let result = Machine::new(MachineConfig::from(definition));
        assert!(matches!(result, Err(DispatchError::UnknownAction { .. })));
    }

    #[test]
    fn dangling_target_reports_unknown_state() {
        let mut config = MachineConfig::from(search_box("m"));
        config.machines[0]
            .states
            .get_mut("initial")
            .unwrap()
            .on
            .insert("JUMP".to_string(), Transition::from("nowhere"));
        let machine = Machine::new(config).unwrap();

        let error = machine.send("JUMP").unwrap_err();

        assert_eq!(
            error,
            DispatchError::UnknownState {
                machine: "m".to_string(),
                state: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn set_actions_replaces_for_later_transitions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = MachineBuilder::new("m")
            .initial("a")
            .state("a", StateBuilder::new().on("GO", "b"))
            .state("b", StateBuilder::new().entry("x").on("BACK", "a"))
            .build()
            .unwrap();
        let machine = Machine::new(MachineConfig::from(definition)).unwrap();

        machine.set_actions([("x", Action::new(recorder(&log, "first")))]);
        machine.send("GO").unwrap();
        machine.send("BACK").unwrap();
        machine.set_actions([("x", Action::new(recorder(&log, "second")))]);
        machine.send("GO").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn instances_share_nothing() {
        let first = Machine::new(MachineConfig::from(search_box("m"))).unwrap();
        let second = Machine::new(MachineConfig::from(search_box("m"))).unwrap();

        first.send("INPUT").unwrap();

        assert_eq!(second.state(), snapshot(&[("m", "initial")]));
        assert_ne!(first.instance_id(), second.instance_id());
    }
}
