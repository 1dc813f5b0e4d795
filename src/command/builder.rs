//! Builder for closure-backed commands.

use crate::command::error::ConfigurationError;
use crate::command::{Action, ActionCommand, CommandResult, DEFAULT_NAME};
use crate::history::{StackHandle, WeakStack};
use std::rc::Rc;

/// Builder for constructing [`ActionCommand`]s with a fluent API.
#[derive(Default)]
pub struct CommandBuilder {
    name: Option<String>,
    execute: Option<Action>,
    undo: Option<Action>,
    redo: Option<Action>,
    stack: Option<WeakStack>,
}

impl CommandBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a label used in logs and errors (optional).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an infallible action (required, unless `try_execute` is used).
    pub fn execute<F>(self, action: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.try_execute(move || {
            action();
            Ok(())
        })
    }

    /// Set a fallible action.
    pub fn try_execute<F>(mut self, action: F) -> Self
    where
        F: Fn() -> CommandResult + 'static,
    {
        self.execute = Some(Box::new(action));
        self
    }

    /// Set an infallible inverse action (optional).
    pub fn undo<F>(self, action: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.try_undo(move || {
            action();
            Ok(())
        })
    }

    /// Set a fallible inverse action.
    pub fn try_undo<F>(mut self, action: F) -> Self
    where
        F: Fn() -> CommandResult + 'static,
    {
        self.undo = Some(Box::new(action));
        self
    }

    /// Set a redo action distinct from the execute action (optional).
    pub fn redo<F>(mut self, action: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.redo = Some(Box::new(move || {
            action();
            Ok(())
        }));
        self
    }

    /// Record the command on `stack` every time it is executed (optional).
    pub fn stack(mut self, stack: &StackHandle) -> Self {
        self.stack = Some(stack.downgrade());
        self
    }

    /// Build the command.
    pub fn build(self) -> Result<Rc<ActionCommand>, ConfigurationError> {
        let execute = self.execute.ok_or(ConfigurationError::MissingExecute)?;
        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());

        if let Some(stack) = &self.stack {
            if stack.upgrade().is_none() {
                return Err(ConfigurationError::DetachedStack { command: name });
            }
        }

        let (undo, redo, stack) = (self.undo, self.redo, self.stack);
        Ok(Rc::new_cyclic(|this| ActionCommand {
            name,
            execute,
            undo,
            redo,
            stack,
            this: this.clone(),
        }))
    }
}
