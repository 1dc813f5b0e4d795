//! Per-class state registries and the inheritance-aware merge.

use crate::state::error::StateError;
use crate::state::table::{BoundMethod, StateTable};
use crate::state::Stateful;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// One state after merging: every method of the class, resolved.
pub struct ResolvedState<H: Stateful> {
    name: String,
    methods: BTreeMap<String, Arc<BoundMethod<H>>>,
}

impl<H: Stateful> ResolvedState<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, method: &str) -> Option<&Arc<BoundMethod<H>>> {
        self.methods.get(method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.keys().map(String::as_str)
    }

    pub(crate) fn methods(&self) -> impl Iterator<Item = (&String, &Arc<BoundMethod<H>>)> + '_ {
        self.methods.iter()
    }
}

/// Immutable result of [`StateSet::merge`], shared by every instance of a class.
///
/// Every state exposes the same method names.
pub struct MergedStates<H: Stateful> {
    class: String,
    states: BTreeMap<String, Arc<ResolvedState<H>>>,
    methods: BTreeSet<String>,
}

impl<H: Stateful> MergedStates<H> {
    pub(crate) fn empty(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            states: BTreeMap::new(),
            methods: BTreeSet::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn state(&self, name: &str) -> Option<&Arc<ResolvedState<H>>> {
        self.states.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn get(&self, state: &str, method: &str) -> Option<&Arc<BoundMethod<H>>> {
        self.states.get(state).and_then(|s| s.get(method))
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.keys().map(String::as_str)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.iter().map(String::as_str)
    }
}

impl<H: Stateful> fmt::Debug for MergedStates<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedStates")
            .field("class", &self.class)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("methods", &self.methods)
            .finish()
    }
}

/// State declarations for one class, linked to its parent class.
///
/// # Example
///
/// ```rust
/// use demeanor::state::{Reply, StateDispatcher, StateSet, StateTable, Stateful};
/// struct Door {
///     states: StateDispatcher<Door>,
/// }
///
/// impl Stateful for Door {
///     type Args = ();
///     type Output = &'static str;
///
///     fn dispatcher(&self) -> &StateDispatcher<Self> {
///         &self.states
///     }
///
///     fn dispatcher_mut(&mut self) -> &mut StateDispatcher<Self> {
///         &mut self.states
///     }
/// }
///
/// let doors = StateSet::<Door>::new("Door");
/// doors.declare([
///     ("open", StateTable::<Door>::new().method("knock", |_, _, _| "come in")),
///     ("locked", StateTable::<Door>::new()),
/// ]);
/// let merged = doors.merge().unwrap();
///
/// let mut door = Door { states: StateDispatcher::new(merged) };
/// door.set_state("locked").unwrap();
/// assert_eq!(door.dispatch("knock", ()).unwrap(), Reply::Receiver);
///
/// door.set_state("open").unwrap();
/// assert_eq!(door.dispatch("knock", ()).unwrap(), Reply::Value("come in"));
/// ```
pub struct StateSet<H: Stateful> {
    class: String,
    parent: Option<Arc<StateSet<H>>>,
    declared: RwLock<Declared<H>>,
}

struct Declared<H: Stateful> {
    own: BTreeMap<String, StateTable<H>>,
    merged: Option<Arc<MergedStates<H>>>,
}

impl<H: Stateful> StateSet<H> {
    /// Registry for a root class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            parent: None,
            declared: RwLock::new(Declared {
                own: BTreeMap::new(),
                merged: None,
            }),
        }
    }

    /// Registry for a class inheriting from `parent`.
    ///
    /// The parent stays open for declarations; children see them on their
    /// next merge.
    pub fn inherit(parent: &Arc<StateSet<H>>, class: impl Into<String>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            ..Self::new(class)
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn parent(&self) -> Option<&Arc<StateSet<H>>> {
        self.parent.as_ref()
    }

    /// Register or overwrite named states on this class.
    ///
    /// Tables that were already merged, here or in any descendant, are
    /// unaffected until the next merge.
    pub fn declare<I, K>(&self, states: I) -> &Self
    where
        I: IntoIterator<Item = (K, StateTable<H>)>,
        K: Into<String>,
    {
        let mut declared = self.write();
        for (name, table) in states {
            declared.own.insert(name.into(), table);
        }
        self
    }

    /// Names declared on this class itself, in order.
    pub fn own_state_names(&self) -> Vec<String> {
        self.read().own.keys().cloned().collect()
    }

    /// Rebuild the merged table from the root class down to this one.
    ///
    /// On failure the previously merged table, if any, stays in place.
    pub fn merge(&self) -> Result<Arc<MergedStates<H>>, StateError> {
        let merged = Arc::new(self.resolve()?);
        tracing::debug!(
            class = %self.class,
            states = merged.states.len(),
            methods = merged.methods.len(),
            "states merged"
        );
        self.write().merged = Some(Arc::clone(&merged));
        Ok(merged)
    }

    /// Table used by instances of this class.
    ///
    /// A class that declares nothing and was never merged shares its parent's table.
    pub fn merged(&self) -> Option<Arc<MergedStates<H>>> {
        let declared = self.read();
        match (&declared.merged, &self.parent) {
            (Some(merged), _) => Some(Arc::clone(merged)),
            (None, Some(parent)) if declared.own.is_empty() => parent.merged(),
            _ => None,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Declared<H>> {
        self.declared.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Declared<H>> {
        self.declared.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self) -> Result<MergedStates<H>, StateError> {
        let parent = match &self.parent {
            Some(parent) => Some(parent.resolve()?),
            None => None,
        };
        let declared = self.read();
        self.check_superset(&declared.own, parent.as_ref())?;

        let mut state_names: BTreeSet<String> = declared.own.keys().cloned().collect();
        let mut methods: BTreeSet<String> = declared
            .own
            .values()
            .flat_map(|table| table.method_names().map(str::to_string))
            .collect();
        if let Some(parent) = &parent {
            state_names.extend(parent.states.keys().cloned());
            methods.extend(parent.methods.iter().cloned());
        }

        let mut states = BTreeMap::new();
        for state in &state_names {
            let mut resolved = BTreeMap::new();
            for method in &methods {
                let inherited = parent
                    .as_ref()
                    .and_then(|p| p.get(state, method))
                    .cloned();
                let own = declared.own.get(state).and_then(|table| table.get(method));
                let bound = match (own, inherited) {
                    (Some(body), inherited) => {
                        Arc::new(BoundMethod::defined(Arc::clone(body), inherited))
                    }
                    (None, Some(inherited)) => inherited,
                    (None, None) => Arc::new(BoundMethod::noop()),
                };
                resolved.insert(method.clone(), bound);
            }
            states.insert(
                state.clone(),
                Arc::new(ResolvedState {
                    name: state.clone(),
                    methods: resolved,
                }),
            );
        }

        Ok(MergedStates {
            class: self.class.clone(),
            states,
            methods,
        })
    }

    /// Every parent state must be redeclared by a class that declares states.
    /// All missing names are collected, not just the first.
    fn check_superset(
        &self,
        own: &BTreeMap<String, StateTable<H>>,
        parent: Option<&MergedStates<H>>,
    ) -> Result<(), StateError> {
        let Some(parent) = parent else {
            return Ok(());
        };
        if own.is_empty() {
            return Ok(());
        }

        let checks: Vec<Validation<(), NonEmptyVec<String>>> = parent
            .state_names()
            .map(|name| {
                if own.contains_key(name) {
                    Validation::success(())
                } else {
                    Validation::fail(name.to_string())
                }
            })
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(missing) => Err(StateError::Inheritance {
                class: self.class.clone(),
                missing: missing.iter().cloned().collect(),
            }),
        }
    }
}

impl<H: Stateful> fmt::Debug for StateSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declared = self.read();
        f.debug_struct("StateSet")
            .field("class", &self.class)
            .field("parent", &self.parent.as_ref().map(|p| p.class()))
            .field("own", &declared.own.keys().collect::<Vec<_>>())
            .field("merged", &declared.merged.is_some())
            .finish()
    }
}
