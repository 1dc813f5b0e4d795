//! Errors for command construction and execution.

use thiserror::Error;

/// Errors that can occur when building a command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Command has no execute action. Call .execute(f) or .try_execute(f) before .build()")]
    MissingExecute,

    #[error("Command '{command}' was given a stack that has already been dropped")]
    DetachedStack { command: String },
}

/// Errors raised while running a command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The command has no inverse action.
    #[error("Command '{command}' cannot be undone")]
    Unsupported { command: String },

    /// A caller-supplied action reported a failure.
    #[error("Command action failed: {0}")]
    ActionFailed(String),

    /// The command's stack is already in the middle of an operation.
    #[error("History stack is busy; a command cannot record while its stack is replaying")]
    StackBusy,
}

impl CommandError {
    /// Shorthand for an action failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::ActionFailed(message.into())
    }
}
