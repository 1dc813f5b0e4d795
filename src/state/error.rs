//! State declaration and dispatch errors.

use thiserror::Error;

/// Errors that can occur when merging or switching states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Class '{class}' must redeclare every parent state; missing: {}", .missing.join(", "))]
    Inheritance { class: String, missing: Vec<String> },

    #[error("Unknown state '{name}'")]
    UnknownState { name: String },

    #[error("No state has been set")]
    NoState,

    #[error("Current state has no method '{method}'")]
    UnknownMethod { method: String },

    #[error("States for class '{class}' have not been merged. Call .merge() first")]
    NotMerged { class: String },
}
