//! Method tables and their merged, callable form.

use crate::state::{Reply, Stateful};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a state method.
///
/// The method receives the instance, the call arguments and a handle to the
/// implementation it overrides.
pub type MethodFn<H> = dyn Fn(&mut H, <H as Stateful>::Args, &Ancestor<H>) -> <H as Stateful>::Output
    + Send
    + Sync;

/// Named method implementations making up one state.
pub struct StateTable<H: Stateful> {
    methods: BTreeMap<String, Arc<MethodFn<H>>>,
}

impl<H: Stateful> StateTable<H> {
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Add or replace a method.
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut H, H::Args, &Ancestor<H>) -> H::Output + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(body));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MethodFn<H>>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Bind every method with no ancestor, for states set by table.
    pub(crate) fn bind_standalone(&self) -> impl Iterator<Item = (String, Arc<BoundMethod<H>>)> + '_ {
        self.methods
            .iter()
            .map(|(name, body)| (name.clone(), Arc::new(BoundMethod::defined(Arc::clone(body), None))))
    }
}

impl<H: Stateful> Default for StateTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Stateful> Clone for StateTable<H> {
    fn clone(&self) -> Self {
        Self {
            methods: self.methods.clone(),
        }
    }
}

impl<H: Stateful> fmt::Debug for StateTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

enum Body<H: Stateful> {
    Noop,
    Defined(Arc<MethodFn<H>>),
}

/// A method as resolved by a merge: its body plus the implementation it
/// overrides at the parent level.
pub struct BoundMethod<H: Stateful> {
    body: Body<H>,
    ancestor: Option<Arc<BoundMethod<H>>>,
}

impl<H: Stateful> BoundMethod<H> {
    pub(crate) fn defined(body: Arc<MethodFn<H>>, ancestor: Option<Arc<BoundMethod<H>>>) -> Self {
        Self {
            body: Body::Defined(body),
            ancestor,
        }
    }

    pub(crate) fn noop() -> Self {
        Self {
            body: Body::Noop,
            ancestor: None,
        }
    }

    /// Whether this is a generated placeholder.
    pub fn is_noop(&self) -> bool {
        matches!(self.body, Body::Noop)
    }

    /// Call the method with `host` as receiver.
    ///
    /// Placeholders return [`Reply::Receiver`] without touching `host`.
    pub fn invoke(&self, host: &mut H, args: H::Args) -> Reply<H::Output> {
        match &self.body {
            Body::Noop => Reply::Receiver,
            Body::Defined(body) => {
                let ancestor = Ancestor {
                    method: self.ancestor.clone(),
                };
                Reply::Value(body(host, args, &ancestor))
            }
        }
    }
}

impl<H: Stateful> fmt::Debug for BoundMethod<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("noop", &self.is_noop())
            .field("overrides", &self.ancestor.is_some())
            .finish()
    }
}

/// The overridden implementation, fixed at merge time.
pub struct Ancestor<H: Stateful> {
    method: Option<Arc<BoundMethod<H>>>,
}

impl<H: Stateful> Ancestor<H> {
    /// Call the parent level's implementation for the same state and method.
    ///
    /// With no parent implementation this behaves like a placeholder.
    pub fn call(&self, host: &mut H, args: H::Args) -> Reply<H::Output> {
        match &self.method {
            Some(method) => method.invoke(host, args),
            None => Reply::Receiver,
        }
    }

    pub fn exists(&self) -> bool {
        self.method.is_some()
    }
}
