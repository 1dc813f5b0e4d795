//! Change notifications emitted by history stacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// How a stack reverses entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackMode {
    /// Each entry's own `undo` is called.
    Direct,
    /// A baseline command resets state and history is replayed up to the target.
    RedoFromStart,
}

/// Which operation produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackEventKind {
    Push,
    Undo,
    Redo,
    Step,
    Clear,
}

/// Snapshot of a stack's bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackStatus {
    pub position: usize,
    pub length: usize,
    pub mode: StackMode,
}

/// Notification delivered to stack observers after the history changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackEvent {
    pub kind: StackEventKind,
    pub status: StackStatus,
    pub at: DateTime<Utc>,
}

impl StackEvent {
    pub(crate) fn now(kind: StackEventKind, status: StackStatus) -> Self {
        Self {
            kind,
            status,
            at: Utc::now(),
        }
    }
}

/// Callback invoked with every [`StackEvent`].
pub type Observer = Rc<dyn Fn(&StackEvent)>;
