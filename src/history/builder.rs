//! Builder for history stacks.

use crate::command::Command;
use crate::history::event::{Observer, StackEvent};
use crate::history::{HistoryStack, StackHandle};
use std::rc::Rc;

/// Builder for configuring a [`HistoryStack`].
#[derive(Default)]
pub struct StackBuilder {
    baseline: Option<Rc<dyn Command>>,
    observers: Vec<Observer>,
}

impl StackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable redo-from-start mode with `baseline` as the reset command.
    pub fn redo_from_start(mut self, baseline: Rc<dyn Command>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Add an observer (optional).
    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&StackEvent) + 'static,
    {
        self.observers.push(Rc::new(observer));
        self
    }

    /// Build an owned stack.
    pub fn build(self) -> HistoryStack {
        let mut stack = HistoryStack::new();
        if let Some(baseline) = self.baseline {
            stack.set_baseline(baseline);
        }
        for observer in self.observers {
            stack.attach(observer);
        }
        stack
    }

    /// Build a stack behind a shared handle that commands can record onto.
    pub fn shared(self) -> StackHandle {
        StackHandle::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;
    use crate::history::StackMode;

    #[test]
    fn default_builder_gives_direct_stack() {
        let stack = StackBuilder::new().build();

        assert_eq!(stack.mode(), StackMode::Direct);
        assert!(stack.is_empty());
    }

    #[test]
    fn baseline_enables_redo_from_start() {
        let baseline = CommandBuilder::new().execute(|| {}).build().unwrap();

        let stack = StackBuilder::new().redo_from_start(baseline).build();

        assert_eq!(stack.mode(), StackMode::RedoFromStart);
    }
}
