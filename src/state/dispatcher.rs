//! Per-instance state binding.

use crate::state::error::StateError;
use crate::state::set::{MergedStates, ResolvedState, StateSet};
use crate::state::table::{BoundMethod, StateTable};
use crate::state::Stateful;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A state given by registered name or by table.
pub enum StateTarget<H: Stateful> {
    Name(String),
    Table(Arc<StateTable<H>>),
}

impl<H: Stateful> From<&str> for StateTarget<H> {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl<H: Stateful> From<String> for StateTarget<H> {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<H: Stateful> From<Arc<StateTable<H>>> for StateTarget<H> {
    fn from(table: Arc<StateTable<H>>) -> Self {
        Self::Table(table)
    }
}

impl<H: Stateful> From<&Arc<StateTable<H>>> for StateTarget<H> {
    fn from(table: &Arc<StateTable<H>>) -> Self {
        Self::Table(Arc::clone(table))
    }
}

enum Current<H: Stateful> {
    Named(Arc<ResolvedState<H>>),
    Table(Arc<StateTable<H>>),
}

/// Dispatch table owned by one instance.
///
/// `set_state` rebuilds the table from the class's merged states; method
/// calls then go through a single lookup.
pub struct StateDispatcher<H: Stateful> {
    states: Arc<MergedStates<H>>,
    current: Option<Current<H>>,
    installed: HashMap<String, Arc<BoundMethod<H>>>,
}

impl<H: Stateful> StateDispatcher<H> {
    /// Dispatcher for an instance of the class whose merged states are `states`.
    pub fn new(states: Arc<MergedStates<H>>) -> Self {
        Self {
            states,
            current: None,
            installed: HashMap::new(),
        }
    }

    /// Dispatcher for an instance of `class`.
    pub fn for_class(class: &StateSet<H>) -> Result<Self, StateError> {
        class.merged().map(Self::new).ok_or_else(|| StateError::NotMerged {
            class: class.class().to_string(),
        })
    }

    /// Dispatcher with no registered states; only tables can be set.
    pub fn detached(class: impl Into<String>) -> Self {
        Self::new(Arc::new(MergedStates::empty(class)))
    }

    pub fn states(&self) -> &Arc<MergedStates<H>> {
        &self.states
    }

    /// Name of the active state, if it was set by name.
    pub fn current(&self) -> Option<&str> {
        match &self.current {
            Some(Current::Named(state)) => Some(state.name()),
            _ => None,
        }
    }

    pub fn has_state(&self) -> bool {
        self.current.is_some()
    }

    /// Switch to a state, replacing every installed method.
    ///
    /// An unknown name fails before anything changes.
    pub fn set_state(&mut self, target: impl Into<StateTarget<H>>) -> Result<(), StateError> {
        match target.into() {
            StateTarget::Name(name) => {
                let state = self
                    .states
                    .state(&name)
                    .cloned()
                    .ok_or(StateError::UnknownState { name })?;
                self.installed = state
                    .methods()
                    .map(|(method, bound)| (method.clone(), Arc::clone(bound)))
                    .collect();
                tracing::debug!(
                    class = self.states.class(),
                    state = state.name(),
                    "state set"
                );
                self.current = Some(Current::Named(state));
            }
            StateTarget::Table(table) => {
                self.installed = table.bind_standalone().collect();
                tracing::debug!(
                    class = self.states.class(),
                    methods = table.len(),
                    "state set from table"
                );
                self.current = Some(Current::Table(table));
            }
        }
        Ok(())
    }

    /// Whether the active state matches any candidate, by name or by table identity.
    pub fn in_state<I, T>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<StateTarget<H>>,
    {
        let Some(current) = &self.current else {
            return false;
        };
        candidates
            .into_iter()
            .any(|candidate| match (current, candidate.into()) {
                (Current::Named(state), StateTarget::Name(name)) => state.name() == name,
                (Current::Table(table), StateTarget::Table(other)) => Arc::ptr_eq(table, &other),
                _ => false,
            })
    }

    /// Look up the installed implementation of `method`.
    pub fn resolve(&self, method: &str) -> Result<Arc<BoundMethod<H>>, StateError> {
        if self.current.is_none() {
            return Err(StateError::NoState);
        }
        self.installed
            .get(method)
            .cloned()
            .ok_or_else(|| StateError::UnknownMethod {
                method: method.to_string(),
            })
    }
}

impl<H: Stateful> fmt::Debug for StateDispatcher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = match &self.current {
            Some(Current::Named(state)) => Some(state.name()),
            Some(Current::Table(_)) => Some("<table>"),
            None => None,
        };
        f.debug_struct("StateDispatcher")
            .field("class", &self.states.class())
            .field("current", &current)
            .field("installed", &self.installed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Reply;
    use tracing_test::traced_test;

    struct Lamp {
        brightness: u8,
        states: StateDispatcher<Lamp>,
    }

    impl Stateful for Lamp {
        type Args = u8;
        type Output = u8;

        fn dispatcher(&self) -> &StateDispatcher<Self> {
            &self.states
        }

        fn dispatcher_mut(&mut self) -> &mut StateDispatcher<Self> {
            &mut self.states
        }
    }

    fn lamp_class() -> StateSet<Lamp> {
        let set = StateSet::<Lamp>::new("Lamp");
        set.declare([
            (
                "on",
                StateTable::<Lamp>::new()
                    .method("dim", |lamp, by, _| {
                        lamp.brightness = lamp.brightness.saturating_sub(by);
                        lamp.brightness
                    })
                    .method("level", |lamp, _, _| lamp.brightness),
            ),
            (
                "off",
                StateTable::<Lamp>::new().method("level", |_, _, _| 0),
            ),
        ]);
        set.merge().unwrap();
        set
    }

    fn lamp() -> Lamp {
        Lamp {
            brightness: 10,
            states: StateDispatcher::for_class(&lamp_class()).unwrap(),
        }
    }

    #[test]
    fn dispatch_without_state_fails() {
        let mut lamp = lamp();

        assert_eq!(lamp.dispatch("level", 0), Err(StateError::NoState));
        assert!(!lamp.states.has_state());
    }

    #[test]
    fn set_state_unknown_name_fails_and_keeps_current() {
        let mut lamp = lamp();
        lamp.set_state("on").unwrap();

        let result = lamp.set_state("broken");

        assert_eq!(
            result,
            Err(StateError::UnknownState {
                name: "broken".to_string()
            })
        );
        assert_eq!(lamp.current_state(), Some("on"));
    }

    #[test]
    fn dispatch_uses_active_state() {
        let mut lamp = lamp();
        lamp.set_state("on").unwrap();

        assert_eq!(lamp.dispatch("dim", 3).unwrap(), Reply::Value(7));
        assert_eq!(lamp.dispatch("level", 0).unwrap(), Reply::Value(7));
    }

    #[test]
    fn rebinding_replaces_previous_methods() {
        let mut lamp = lamp();
        lamp.set_state("on").unwrap();
        lamp.set_state("off").unwrap();

        assert_eq!(lamp.dispatch("level", 0).unwrap(), Reply::Value(0));
        assert_eq!(lamp.dispatch("dim", 3).unwrap(), Reply::Receiver);
        assert_eq!(lamp.brightness, 10);
    }

    #[test]
    fn in_state_matches_any_candidate_name() {
        let mut lamp = lamp();
        assert!(!lamp.in_state(["on", "off"]));

        lamp.set_state("off").unwrap();

        assert!(lamp.in_state(["on", "off"]));
        assert!(lamp.in_state(["off"]));
        assert!(!lamp.in_state(["on"]));
    }

    #[test]
    fn table_state_matches_by_identity() {
        let mut lamp = lamp();
        let flicker = Arc::new(StateTable::<Lamp>::new().method("level", |_, _, _| 99));
        let lookalike = Arc::new(StateTable::<Lamp>::new().method("level", |_, _, _| 99));

        lamp.set_state(&flicker).unwrap();

        assert!(lamp.in_state([&flicker]));
        assert!(!lamp.in_state([&lookalike]));
        assert!(!lamp.in_state(["on"]));
        assert_eq!(lamp.current_state(), None);
        assert_eq!(lamp.dispatch("level", 0).unwrap(), Reply::Value(99));
    }

    #[test]
    fn table_state_rejects_methods_it_lacks() {
        let mut lamp = lamp();
        lamp.set_state(Arc::new(StateTable::<Lamp>::new())).unwrap();

        assert_eq!(
            lamp.dispatch("dim", 1),
            Err(StateError::UnknownMethod {
                method: "dim".to_string()
            })
        );
    }

    #[test]
    fn for_class_requires_merge() {
        let set = StateSet::<Lamp>::new("Lamp");
        set.declare([("on", StateTable::<Lamp>::new())]);

        let result = StateDispatcher::for_class(&set);

        assert!(matches!(result, Err(StateError::NotMerged { .. })));
    }

    #[test]
    fn detached_dispatcher_knows_no_names() {
        let mut states = StateDispatcher::<Lamp>::detached("Loose");

        assert!(matches!(
            states.set_state("on"),
            Err(StateError::UnknownState { .. })
        ));
        assert_eq!(states.states().class(), "Loose");
    }

    #[traced_test]
    #[test]
    fn set_state_is_logged() {
        let mut lamp = lamp();

        lamp.set_state("on").unwrap();

        assert!(logs_contain("state set"));
    }
}
