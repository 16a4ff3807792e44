use crate::scheduler::Task;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// How long an idle worker sleeps before re-checking the other queues.
///
/// Pushes to a local queue do not signal the condition variable, so
/// idle workers wake periodically to look for work to steal.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Global task queue of a pool.
///
/// Tasks scheduled from outside the pool are pushed here. The injector
/// also coordinates parking of idle workers.
pub(crate) struct Injector {
    queue: Mutex<VecDeque<Task>>,

    /// Signalled whenever a task is pushed or shutdown starts.
    condvar: Condvar,

    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    ///
    /// The flag is raised under the queue lock, so every `push` either
    /// lands before it, and is seen by a later `drain`, or is refused.
    pub(crate) fn shutdown(&self) {
        let queue = self.queue.lock();
        self.shutdown.store(true, Ordering::Release);
        drop(queue);

        self.condvar.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Pushes a task and wakes one parked worker.
    ///
    /// After shutdown the task is handed back to the caller, which must
    /// drop it outside of any pool lock.
    pub(crate) fn push(&self, task: Task) -> Result<(), Task> {
        let mut queue = self.queue.lock();

        if self.is_shutdown() {
            return Err(task);
        }

        queue.push_back(task);
        drop(queue);

        self.condvar.notify_one();
        Ok(())
    }

    /// Parks the current worker until work arrives, shutdown starts, or
    /// the park timeout elapses.
    pub(crate) fn park(&self) {
        let mut queue = self.queue.lock();

        if !queue.is_empty() || self.is_shutdown() {
            return;
        }

        let _ = self.condvar.wait_for(&mut queue, PARK_TIMEOUT);
    }

    /// Takes the oldest task.
    pub(crate) fn steal(&self) -> Option<Task> {
        self.queue.lock().pop_front()
    }

    /// Removes every queued task.
    pub(crate) fn drain(&self) -> Vec<Task> {
        self.queue.lock().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_after_shutdown_is_refused() {
        let injector = Injector::new();
        assert!(injector.push(Box::new(|| {})).is_ok());

        injector.shutdown();
        assert_eq!(injector.drain().len(), 1);

        assert!(injector.push(Box::new(|| {})).is_err());
        assert!(injector.drain().is_empty());
    }
}
