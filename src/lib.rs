//! Demeanor: reversible commands and state-dependent behavior
//!
//! Two small behavioral building blocks for application code:
//!
//! - **Commands** wrap an action and, optionally, its inverse. Commands can
//!   record themselves on a **history stack** that supports undo, redo,
//!   stepping to any position and a redo-from-start mode for effects that
//!   cannot be inverted.
//! - **States** let a type's method behavior vary with a named current state.
//!   State tables merge across a class hierarchy so that every state exposes
//!   the same methods and overrides can reach the version they replace.
//!
//! Everything runs synchronously on the calling thread. Stacks and dispatchers
//! do no locking; share them across threads only with external serialization.
//!
//! # Example
//!
//! ```rust
//! use demeanor::{Command, CommandBuilder, HistoryStack};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let counter = Rc::new(Cell::new(0));
//! let stack = HistoryStack::builder().shared();
//!
//! let make = |counter: &Rc<Cell<i32>>| {
//!     let up = Rc::clone(counter);
//!     let down = Rc::clone(counter);
//!     CommandBuilder::new()
//!         .execute(move || up.set(up.get() + 1))
//!         .undo(move || down.set(down.get() - 1))
//!         .stack(&stack)
//!         .build()
//!         .unwrap()
//! };
//!
//! for _ in 0..4 {
//!     make(&counter).execute().unwrap();
//! }
//! stack.step_to(2).unwrap();
//! assert_eq!(counter.get(), 2);
//!
//! make(&counter).execute().unwrap();
//! assert_eq!((stack.len().unwrap(), stack.position().unwrap(), counter.get()), (3, 3, 3));
//! ```

pub mod command;
pub mod history;
pub mod state;

// Re-export commonly used types
pub use command::{ActionCommand, Command, CommandBuilder, CommandError, ConfigurationError};
pub use history::{HistoryError, HistoryStack, StackEvent, StackHandle};
pub use state::{Reply, StateDispatcher, StateError, StateSet, StateTable, Stateful};
