//! Reversible commands.
//!
//! A command wraps an action and, optionally, its inverse. Any type that
//! implements [`Command`] can be recorded on a [`HistoryStack`]; the
//! [`ActionCommand`] type covers the common case of building one from a pair
//! of closures.
//!
//! # Example
//!
//! ```rust
//! use demeanor::command::{Command, CommandBuilder};
//! use demeanor::history::HistoryStack;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let counter = Rc::new(Cell::new(0));
//! let stack = HistoryStack::builder().shared();
//!
//! let up = Rc::clone(&counter);
//! let down = Rc::clone(&counter);
//! let increment = CommandBuilder::new()
//!     .name("increment")
//!     .execute(move || up.set(up.get() + 1))
//!     .undo(move || down.set(down.get() - 1))
//!     .stack(&stack)
//!     .build()
//!     .unwrap();
//!
//! increment.execute().unwrap();
//! assert_eq!(counter.get(), 1);
//! assert_eq!(stack.len().unwrap(), 1);
//!
//! stack.undo().unwrap();
//! assert_eq!(counter.get(), 0);
//! ```
//!
//! [`HistoryStack`]: crate::history::HistoryStack

pub mod builder;
pub mod error;

pub use builder::CommandBuilder;
pub use error::{CommandError, ConfigurationError};

use crate::history::WeakStack;
use std::fmt;
use std::rc::Weak;

/// Result of running a command action.
pub type CommandResult = Result<(), CommandError>;

/// Boxed caller-supplied action.
pub type Action = Box<dyn Fn() -> CommandResult>;

/// Name reported by commands that were not given one.
pub const DEFAULT_NAME: &str = "command";

/// An action that can be executed and, optionally, reversed.
///
/// `execute` is the caller-facing entry point and may have bookkeeping side
/// effects such as recording the command on a history stack. `replay` re-runs
/// the same action without any of that bookkeeping; stacks use it when they
/// redo or rebuild history so that replays never re-record.
pub trait Command {
    /// Run the action.
    fn execute(&self) -> CommandResult;

    /// Reverse the action.
    ///
    /// Default implementation reports the command as irreversible.
    fn undo(&self) -> CommandResult {
        Err(CommandError::Unsupported {
            command: self.name().to_string(),
        })
    }

    /// Run the action again without recording it anywhere.
    fn replay(&self) -> CommandResult {
        self.execute()
    }

    /// Re-apply the action after an undo.
    fn redo(&self) -> CommandResult {
        self.replay()
    }

    /// Whether `undo` is supported.
    fn is_reversible(&self) -> bool {
        false
    }

    /// Human-readable label for logs and errors.
    fn name(&self) -> &str {
        DEFAULT_NAME
    }
}

/// Command assembled from closures by [`CommandBuilder`].
///
/// Built commands live behind an `Rc` so that executing one can record the
/// very same command on its stack.
///
/// On a redo-from-start stack with nothing applied, executing a tagged
/// command runs the stack's baseline first. A failing action is not
/// recorded, but the baseline's reset is not rolled back.
pub struct ActionCommand {
    name: String,
    execute: Action,
    undo: Option<Action>,
    redo: Option<Action>,
    stack: Option<WeakStack>,
    this: Weak<ActionCommand>,
}

impl ActionCommand {
    /// Start building a command.
    pub fn builder() -> CommandBuilder {
        CommandBuilder::new()
    }

    /// Whether the command records itself on a stack when executed.
    pub fn is_tagged(&self) -> bool {
        self.stack.is_some()
    }

    fn perform(&self) -> CommandResult {
        (self.execute)()
    }
}

impl Command for ActionCommand {
    fn execute(&self) -> CommandResult {
        let stack = self.stack.as_ref().and_then(WeakStack::upgrade);
        match (stack, self.this.upgrade()) {
            (Some(stack), Some(this)) => stack.record(this),
            _ => self.perform(),
        }
    }

    fn undo(&self) -> CommandResult {
        match &self.undo {
            Some(undo) => undo(),
            None => Err(CommandError::Unsupported {
                command: self.name.clone(),
            }),
        }
    }

    fn replay(&self) -> CommandResult {
        self.perform()
    }

    fn redo(&self) -> CommandResult {
        match &self.redo {
            Some(redo) => redo(),
            None => self.perform(),
        }
    }

    fn is_reversible(&self) -> bool {
        self.undo.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCommand")
            .field("name", &self.name)
            .field("reversible", &self.undo.is_some())
            .field("custom_redo", &self.redo.is_some())
            .field("tagged", &self.stack.is_some())
            .finish()
    }
}
