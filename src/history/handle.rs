//! Shared ownership of a history stack.
//!
//! Commands keep a [`WeakStack`] back to the stack they record onto, so the
//! stack owns its entries and nothing keeps a dropped stack alive.
//!
//! The handle borrows the stack while command callbacks run. A callback that
//! reaches back into the same stack gets [`HistoryError::Busy`] (or
//! [`CommandError::StackBusy`] when recording) instead of observing
//! half-applied bookkeeping. Observers run after the borrow ends, so they can
//! read and drive the stack they watch.

use crate::command::{Command, CommandError, CommandResult};
use crate::history::{HistoryError, HistoryStack, StackEvent, StackStatus};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Caller-owned, cloneable handle to a [`HistoryStack`].
#[derive(Clone)]
pub struct StackHandle {
    inner: Rc<RefCell<HistoryStack>>,
}

/// Non-owning reference held by commands.
#[derive(Clone, Default)]
pub struct WeakStack {
    inner: Weak<RefCell<HistoryStack>>,
}

impl StackHandle {
    pub fn new(stack: HistoryStack) -> Self {
        Self {
            inner: Rc::new(RefCell::new(stack)),
        }
    }

    pub fn downgrade(&self) -> WeakStack {
        WeakStack {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> Result<usize, HistoryError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.read()?.is_empty())
    }

    pub fn position(&self) -> Result<usize, HistoryError> {
        Ok(self.read()?.position())
    }

    pub fn status(&self) -> Result<StackStatus, HistoryError> {
        Ok(self.read()?.status())
    }

    /// Run `f` with read access to the stack.
    pub fn with<R>(&self, f: impl FnOnce(&HistoryStack) -> R) -> Result<R, HistoryError> {
        Ok(f(&*self.read()?))
    }

    pub fn push(&self, command: Rc<dyn Command>) -> Result<(), HistoryError> {
        let notice = self.lock()?.push_quietly(command);
        if let Some(notice) = notice {
            notice.deliver();
        }
        Ok(())
    }

    pub fn undo(&self) -> Result<(), HistoryError> {
        let settled = self.lock()?.undo_quietly();
        settled.deliver()
    }

    pub fn redo(&self) -> Result<(), HistoryError> {
        let settled = self.lock()?.redo_quietly();
        settled.deliver()
    }

    pub fn step_to(&self, position: usize) -> Result<(), HistoryError> {
        let settled = self.lock()?.step_to_quietly(position);
        settled.deliver()
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let notice = self.lock()?.clear_quietly();
        if let Some(notice) = notice {
            notice.deliver();
        }
        Ok(())
    }

    pub fn subscribe<F>(&self, observer: F) -> Result<(), HistoryError>
    where
        F: Fn(&StackEvent) + 'static,
    {
        self.lock()?.subscribe(observer);
        Ok(())
    }

    /// Run `command`'s action and record it.
    ///
    /// On a fresh redo-from-start history the baseline runs first, since the
    /// action has to apply to the reset state. If the action then fails,
    /// nothing is recorded but the baseline's reset stays in effect.
    pub(crate) fn record(&self, command: Rc<dyn Command>) -> CommandResult {
        let notice = {
            let mut stack = self
                .inner
                .try_borrow_mut()
                .map_err(|_| CommandError::StackBusy)?;
            stack.prepare_record()?;
            command.replay()?;
            stack.push_quietly(command)
        };
        if let Some(notice) = notice {
            notice.deliver();
        }
        Ok(())
    }

    fn read(&self) -> Result<Ref<'_, HistoryStack>, HistoryError> {
        self.inner.try_borrow().map_err(|_| HistoryError::Busy)
    }

    fn lock(&self) -> Result<RefMut<'_, HistoryStack>, HistoryError> {
        self.inner.try_borrow_mut().map_err(|_| HistoryError::Busy)
    }
}

impl fmt::Debug for StackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(stack) => fmt::Debug::fmt(&*stack, f),
            Err(_) => f.write_str("StackHandle(<busy>)"),
        }
    }
}

impl WeakStack {
    pub fn upgrade(&self) -> Option<StackHandle> {
        self.inner.upgrade().map(|inner| StackHandle { inner })
    }
}

impl fmt::Debug for WeakStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStack")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;
    use crate::history::StackMode;
    use std::cell::Cell;

    #[test]
    fn handle_clones_share_one_stack() {
        let stack = HistoryStack::builder().shared();
        let other = stack.clone();
        let command = CommandBuilder::new()
            .execute(|| {})
            .stack(&stack)
            .build()
            .unwrap();

        command.execute().unwrap();

        assert_eq!(other.len(), Ok(1));
    }

    #[test]
    fn weak_stack_does_not_keep_stack_alive() {
        let stack = HistoryStack::builder().shared();
        let weak = stack.downgrade();

        assert!(weak.upgrade().is_some());
        drop(stack);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn nested_record_reports_busy() {
        let stack = HistoryStack::builder().shared();
        let inner = CommandBuilder::new()
            .execute(|| {})
            .stack(&stack)
            .build()
            .unwrap();
        let nested = Rc::clone(&inner);
        let outer = CommandBuilder::new()
            .try_execute(move || nested.execute())
            .stack(&stack)
            .build()
            .unwrap();

        let result = outer.execute();

        assert_eq!(result, Err(CommandError::StackBusy));
        assert_eq!(stack.len(), Ok(0));
    }

    #[test]
    fn undo_from_inside_callback_reports_busy() {
        let stack = HistoryStack::builder().shared();
        let weak = stack.downgrade();
        let outcome = Rc::new(Cell::new(None));
        let seen = Rc::clone(&outcome);
        let command = CommandBuilder::new()
            .execute(|| {})
            .undo(move || {
                if let Some(stack) = weak.upgrade() {
                    seen.set(Some(stack.redo()));
                }
            })
            .stack(&stack)
            .build()
            .unwrap();
        command.execute().unwrap();

        stack.undo().unwrap();

        assert_eq!(outcome.take(), Some(Err(HistoryError::Busy)));
        assert_eq!(stack.position(), Ok(0));
    }

    #[test]
    fn observer_can_read_the_stack_it_watches() {
        let stack = HistoryStack::builder().shared();
        let weak = stack.downgrade();
        let positions = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&positions);
        stack
            .subscribe(move |_| {
                if let Some(stack) = weak.upgrade() {
                    seen.borrow_mut().push(stack.position());
                }
            })
            .unwrap();
        let command = CommandBuilder::new()
            .execute(|| {})
            .undo(|| {})
            .stack(&stack)
            .build()
            .unwrap();

        command.execute().unwrap();
        stack.undo().unwrap();
        stack.redo().unwrap();
        stack.clear().unwrap();

        assert_eq!(*positions.borrow(), vec![Ok(1), Ok(0), Ok(1), Ok(0)]);
    }

    #[test]
    fn observer_can_drive_the_stack_it_watches() {
        let stack = HistoryStack::builder().shared();
        let weak = stack.downgrade();
        stack
            .subscribe(move |event| {
                if event.status.position == 2 {
                    if let Some(stack) = weak.upgrade() {
                        stack.step_to(1).unwrap();
                    }
                }
            })
            .unwrap();
        let make = || {
            CommandBuilder::new()
                .execute(|| {})
                .undo(|| {})
                .stack(&stack)
                .build()
                .unwrap()
        };

        make().execute().unwrap();
        make().execute().unwrap();

        assert_eq!(stack.position(), Ok(1));
        assert_eq!(stack.len(), Ok(2));
    }

    #[test]
    fn reading_from_inside_an_action_reports_busy() {
        let stack = HistoryStack::builder().shared();
        let weak = stack.downgrade();
        let outcome = Rc::new(Cell::new(None));
        let seen = Rc::clone(&outcome);
        let command = CommandBuilder::new()
            .execute(move || {
                if let Some(stack) = weak.upgrade() {
                    seen.set(Some(stack.len()));
                }
            })
            .stack(&stack)
            .build()
            .unwrap();

        command.execute().unwrap();

        assert_eq!(outcome.take(), Some(Err(HistoryError::Busy)));
        assert_eq!(stack.len(), Ok(1));
        assert!(stack.with(|s| s.can_undo()).unwrap());
    }

    #[test]
    fn first_record_runs_baseline() {
        let resets = Rc::new(Cell::new(0));
        let counter = Rc::clone(&resets);
        let baseline = CommandBuilder::new()
            .execute(move || counter.set(counter.get() + 1))
            .build()
            .unwrap();
        let stack = HistoryStack::builder().redo_from_start(baseline).shared();
        let command = CommandBuilder::new()
            .execute(|| {})
            .stack(&stack)
            .build()
            .unwrap();

        command.execute().unwrap();
        command.execute().unwrap();

        assert_eq!(resets.get(), 1);
        assert_eq!(stack.len(), Ok(2));
    }

    #[test]
    fn failed_first_record_keeps_baseline_reset() {
        let canvas = Rc::new(RefCell::new(vec![1, 2, 3]));
        let wipe = Rc::clone(&canvas);
        let baseline = CommandBuilder::new()
            .execute(move || wipe.borrow_mut().clear())
            .build()
            .unwrap();
        let stack = HistoryStack::builder().redo_from_start(baseline).shared();
        let command = CommandBuilder::new()
            .try_execute(|| Err(CommandError::failed("no ink")))
            .stack(&stack)
            .build()
            .unwrap();

        let result = command.execute();

        assert_eq!(result, Err(CommandError::ActionFailed("no ink".into())));
        assert!(canvas.borrow().is_empty());
        assert_eq!(stack.len(), Ok(0));
    }

    #[test]
    fn with_gives_read_access() {
        let stack = HistoryStack::builder().shared();

        let mode = stack.with(|s| s.mode());

        assert_eq!(mode, Ok(StackMode::Direct));
    }
}
