use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::warn;

/// Ordered buffer of diagnostics emitted by the script runtime, the
/// landscape renderer and their host functions.
///
/// Clones share the same buffer. Callers clear it right before an operation
/// whose diagnostics they want to inspect and read it right after; a missing
/// clear attributes stale messages to the wrong step.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    messages: Rc<RefCell<VecDeque<String>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "mapgen::diagnostics", "{}", message);
        self.messages.borrow_mut().push_back(message);
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }

    pub fn first_message(&self) -> Option<String> {
        self.messages.borrow().front().cloned()
    }

    pub fn count(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().iter().cloned().collect()
    }
}
