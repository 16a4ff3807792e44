use crate::scheduler::Task;

use std::collections::VecDeque;

use parking_lot::Mutex;

/// A per-worker local task queue.
///
/// The owning worker pushes at the back and pops from the front, so tasks
/// scheduled from one worker run in submission order; continuations
/// fired by one settlement keep their registration order. Other workers
/// steal from the back.
pub(crate) struct LocalQueue {
    inner: Mutex<VecDeque<Task>>,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: Task) {
        self.inner.lock().push_back(task);
    }

    /// Takes the oldest task.
    pub(crate) fn pop(&self) -> Option<Task> {
        self.inner.lock().pop_front()
    }

    /// Removes the newest task, for use by other workers.
    pub(crate) fn steal(&self) -> Option<Task> {
        self.inner.lock().pop_back()
    }

    /// Removes every queued task.
    pub(crate) fn drain(&self) -> Vec<Task> {
        self.inner.lock().drain(..).collect()
    }
}
