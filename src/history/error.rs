//! History stack errors.

use crate::command::CommandError;
use thiserror::Error;

/// Errors that can occur while moving through a history stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// Requested position lies outside `0..=length`.
    #[error("Position {requested} is out of range (length: {length})")]
    OutOfRange { requested: usize, length: usize },

    /// The stack was re-entered from inside one of its own callbacks.
    #[error("History stack is busy with another operation")]
    Busy,

    /// A recorded command failed while being undone or replayed.
    #[error(transparent)]
    Command(#[from] CommandError),
}
