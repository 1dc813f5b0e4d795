//! Linear undo/redo history.
//!
//! A [`HistoryStack`] is an ordered list of executed commands plus a pointer
//! to the most recently applied entry. Entries after the pointer are the redo
//! future; recording a new command while the pointer sits mid-history
//! discards that future before appending.
//!
//! ```text
//! push c1..c4          [c1, c2, c3, c4]   position 4
//! step_to(2)           [c1, c2 | c3, c4]  position 2
//! push c5              [c1, c2, c5]       position 3  (c3, c4 discarded)
//! ```
//!
//! # Modes
//!
//! - **Direct**: undo calls the entry's own `undo`, redo calls its `redo`.
//! - **Redo-from-start**: the stack holds a baseline command that resets
//!   application state. Every move runs the baseline and then replays entries
//!   up to the target position. This is the only way to step back over
//!   effects that cannot be inverted, at O(position) cost per move.
//!
//! # Invariants
//!
//! 1. `0 <= position <= len` after every operation
//! 2. `position == len` immediately after any push
//! 3. A failing step leaves the pointer where it was before that step began
//!    (a multi-entry `step_to` in direct mode keeps the entries it finished)
//! 4. Replays never re-record: stacks only call `replay`/`redo` on entries

mod builder;
mod error;
mod event;
mod handle;

pub use builder::StackBuilder;
pub use error::HistoryError;
pub use event::{Observer, StackEvent, StackEventKind, StackMode, StackStatus};
pub use handle::{StackHandle, WeakStack};

use crate::command::{Command, CommandResult};
use std::fmt;
use std::rc::Rc;

/// Ordered, pointer-indexed record of executed commands.
pub struct HistoryStack {
    entries: Vec<Rc<dyn Command>>,
    pointer: usize,
    baseline: Option<Rc<dyn Command>>,
    observers: Vec<Observer>,
}

impl fmt::Debug for HistoryStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStack")
            .field("length", &self.entries.len())
            .field("position", &self.pointer)
            .field("mode", &self.mode())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    /// Create an empty stack in direct mode.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pointer: 0,
            baseline: None,
            observers: Vec::new(),
        }
    }

    /// Start configuring a stack.
    pub fn builder() -> StackBuilder {
        StackBuilder::new()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the most recently applied entry (0 = before the first).
    pub fn position(&self) -> usize {
        self.pointer
    }

    pub fn mode(&self) -> StackMode {
        if self.baseline.is_some() {
            StackMode::RedoFromStart
        } else {
            StackMode::Direct
        }
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.entries.len()
    }

    pub fn status(&self) -> StackStatus {
        StackStatus {
            position: self.pointer,
            length: self.entries.len(),
            mode: self.mode(),
        }
    }

    /// Recorded commands in order, including any redo future.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Command>> + '_ {
        self.entries.iter()
    }

    /// Register a callback run after every change to the history.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&StackEvent) + 'static,
    {
        self.attach(Rc::new(observer));
    }

    /// Record a command that has already been executed.
    ///
    /// Discards every entry after the pointer, appends `command` and moves
    /// the pointer to the new head. The command is not run.
    pub fn push(&mut self, command: Rc<dyn Command>) {
        if let Some(notice) = self.push_quietly(command) {
            notice.deliver();
        }
    }

    /// Step back one entry. Does nothing at position 0.
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        self.undo_quietly().deliver()
    }

    /// Step forward one entry. Does nothing at the head.
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        self.redo_quietly().deliver()
    }

    /// Move the pointer to `position`, undoing or redoing as needed.
    ///
    /// In redo-from-start mode the baseline always runs, even when
    /// `position` equals the current position. In direct mode a failing
    /// entry stops the walk; the pointer stays on the last entry that was
    /// fully applied and observers hear about that partial move before the
    /// error is returned.
    pub fn step_to(&mut self, position: usize) -> Result<(), HistoryError> {
        self.step_to_quietly(position).deliver()
    }

    /// Forget all history without reversing any effects.
    pub fn clear(&mut self) {
        if let Some(notice) = self.clear_quietly() {
            notice.deliver();
        }
    }

    pub(crate) fn attach(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Run the baseline before the first entry of a fresh history is recorded.
    pub(crate) fn prepare_record(&self) -> CommandResult {
        match &self.baseline {
            Some(baseline) if self.pointer == 0 => baseline.replay(),
            _ => Ok(()),
        }
    }

    pub(crate) fn set_baseline(&mut self, baseline: Rc<dyn Command>) {
        self.baseline = Some(baseline);
    }

    pub(crate) fn push_quietly(&mut self, command: Rc<dyn Command>) -> Option<Notice> {
        let discarded = self.entries.len() - self.pointer;
        self.entries.truncate(self.pointer);
        self.entries.push(command);
        self.pointer = self.entries.len();

        tracing::debug!(
            position = self.pointer,
            length = self.entries.len(),
            discarded,
            "command recorded"
        );
        self.notice(StackEventKind::Push)
    }

    pub(crate) fn undo_quietly(&mut self) -> Settled {
        if self.pointer == 0 {
            return Settled::unchanged();
        }
        let before = self.pointer;
        let result = match self.mode() {
            StackMode::Direct => self.undo_entry(),
            StackMode::RedoFromStart => self.replay_to(self.pointer - 1),
        };
        self.settle(StackEventKind::Undo, before, result)
    }

    pub(crate) fn redo_quietly(&mut self) -> Settled {
        if self.pointer == self.entries.len() {
            return Settled::unchanged();
        }
        let before = self.pointer;
        let result = match self.mode() {
            StackMode::Direct => self.redo_entry(),
            StackMode::RedoFromStart => self.replay_to(self.pointer + 1),
        };
        self.settle(StackEventKind::Redo, before, result)
    }

    pub(crate) fn step_to_quietly(&mut self, position: usize) -> Settled {
        if position > self.entries.len() {
            return Settled {
                result: Err(HistoryError::OutOfRange {
                    requested: position,
                    length: self.entries.len(),
                }),
                notice: None,
            };
        }
        let before = self.pointer;
        let result = match self.mode() {
            StackMode::Direct => self.walk_to(position),
            StackMode::RedoFromStart => self.replay_to(position),
        };
        self.settle(StackEventKind::Step, before, result)
    }

    pub(crate) fn clear_quietly(&mut self) -> Option<Notice> {
        let dropped = self.entries.len();
        self.entries.clear();
        self.pointer = 0;

        tracing::debug!(dropped, "history cleared");
        self.notice(StackEventKind::Clear)
    }

    fn undo_entry(&mut self) -> Result<(), HistoryError> {
        let entry = &self.entries[self.pointer - 1];
        if let Err(err) = entry.undo() {
            tracing::warn!(command = entry.name(), error = %err, "undo failed");
            return Err(err.into());
        }
        self.pointer -= 1;
        Ok(())
    }

    fn redo_entry(&mut self) -> Result<(), HistoryError> {
        let entry = &self.entries[self.pointer];
        if let Err(err) = entry.redo() {
            tracing::warn!(command = entry.name(), error = %err, "redo failed");
            return Err(err.into());
        }
        self.pointer += 1;
        Ok(())
    }

    fn walk_to(&mut self, target: usize) -> Result<(), HistoryError> {
        while self.pointer > target {
            self.undo_entry()?;
        }
        while self.pointer < target {
            self.redo_entry()?;
        }
        Ok(())
    }

    /// Pointer only moves once the baseline and every replayed entry succeed.
    fn replay_to(&mut self, target: usize) -> Result<(), HistoryError> {
        if let Some(baseline) = &self.baseline {
            baseline.replay()?;
        }
        for (index, entry) in self.entries[..target].iter().enumerate() {
            tracing::trace!(index, command = entry.name(), "replaying");
            entry.replay()?;
        }
        self.pointer = target;
        Ok(())
    }

    fn settle(&self, kind: StackEventKind, before: usize, result: Result<(), HistoryError>) -> Settled {
        let moved = self.pointer != before;
        match &result {
            Ok(()) => tracing::debug!(
                ?kind,
                position = self.pointer,
                length = self.entries.len(),
                "history moved"
            ),
            Err(err) if moved => tracing::warn!(
                ?kind,
                position = self.pointer,
                error = %err,
                "history stopped part way"
            ),
            Err(_) => {}
        }
        let notice = if result.is_ok() || moved {
            self.notice(kind)
        } else {
            None
        };
        Settled { result, notice }
    }

    fn notice(&self, kind: StackEventKind) -> Option<Notice> {
        if self.observers.is_empty() {
            return None;
        }
        Some(Notice {
            event: StackEvent::now(kind, self.status()),
            observers: self.observers.clone(),
        })
    }
}

/// An event captured under the stack's borrow, delivered after it ends.
pub(crate) struct Notice {
    event: StackEvent,
    observers: Vec<Observer>,
}

impl Notice {
    pub(crate) fn deliver(self) {
        for observer in &self.observers {
            observer(&self.event);
        }
    }
}

/// Result of a move plus the notice it owes observers.
#[must_use]
pub(crate) struct Settled {
    result: Result<(), HistoryError>,
    notice: Option<Notice>,
}

impl Settled {
    fn unchanged() -> Self {
        Self {
            result: Ok(()),
            notice: None,
        }
    }

    pub(crate) fn deliver(self) -> Result<(), HistoryError> {
        if let Some(notice) = self.notice {
            notice.deliver();
        }
        self.result
    }
}
