//! State-dependent method dispatch.
//!
//! A class declares named states, each a table of method implementations.
//! Merging walks the class hierarchy from the root down and produces one
//! table per state in which:
//!
//! - every state exposes the same method names (missing ones become
//!   placeholders that return [`Reply::Receiver`])
//! - a method defined at one level can call, through [`Ancestor`], the
//!   implementation it overrides at the immediate parent level
//!
//! Instances hold a [`StateDispatcher`] and route calls through it.
//!
//! This is not a finite-state machine: no transitions are validated and
//! callers decide when to switch states.

mod dispatcher;
mod error;
pub mod macros;
mod set;
mod table;

pub use dispatcher::{StateDispatcher, StateTarget};
pub use error::StateError;
pub use set::{MergedStates, ResolvedState, StateSet};
pub use table::{Ancestor, BoundMethod, MethodFn, StateTable};

/// What a state method returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<T> {
    /// The method was a placeholder and handed back the receiver untouched.
    Receiver,
    /// The method produced a value.
    Value(T),
}

impl<T> Reply<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Self::Receiver => None,
            Self::Value(value) => Some(value),
        }
    }

    pub fn is_receiver(&self) -> bool {
        matches!(self, Self::Receiver)
    }
}

/// A type whose method behavior depends on its current state.
///
/// Implementors own a [`StateDispatcher`] and expose it; the provided
/// methods do the rest.
pub trait Stateful: Sized + 'static {
    /// Arguments passed to every state method.
    type Args;
    /// Value returned by state methods.
    type Output;

    fn dispatcher(&self) -> &StateDispatcher<Self>;

    fn dispatcher_mut(&mut self) -> &mut StateDispatcher<Self>;

    /// Switch to a named state or to a standalone table.
    fn set_state<T>(&mut self, target: T) -> Result<(), StateError>
    where
        T: Into<StateTarget<Self>>,
    {
        self.dispatcher_mut().set_state(target)
    }

    /// Whether the current state is any of `candidates`.
    fn in_state<I, T>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<StateTarget<Self>>,
    {
        self.dispatcher().in_state(candidates)
    }

    fn current_state(&self) -> Option<&str> {
        self.dispatcher().current()
    }

    /// Call `method` on the current state with `self` as receiver.
    fn dispatch(&mut self, method: &str, args: Self::Args) -> Result<Reply<Self::Output>, StateError> {
        let bound = self.dispatcher().resolve(method)?;
        Ok(bound.invoke(self, args))
    }
}
