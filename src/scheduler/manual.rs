use super::{Executor, Scheduler, Task};

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// A scheduler driven explicitly by its owner.
///
/// Tasks are queued in submission order and only run when
/// [`run_pending`](Self::run_pending) or
/// [`run_until_idle`](Self::run_until_idle) is called. Clones share the
/// same queue.
///
/// Queued tasks own the promises of their futures, and those futures hold
/// an executor pointing back at this queue. Tasks still queued when the
/// last handle goes away are therefore never freed, and their futures
/// stay pending: drive the scheduler until idle before dropping it.
#[derive(Clone, Default)]
pub struct Manual {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl Manual {
    /// Creates an empty manual scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an executor handle feeding this scheduler.
    pub fn executor(&self) -> Executor {
        Executor::new(self.clone())
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs the tasks queued at the time of the call.
    ///
    /// Tasks scheduled while running are left for the next call.
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.queue.lock().drain(..).collect();
        let n = batch.len();

        for task in batch {
            task();
        }

        n
    }

    /// Runs the oldest queued task, if any.
    pub fn run_one(&self) -> bool {
        let task = self.queue.lock().pop_front();

        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including tasks scheduled
    /// along the way. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut n = 0;
        while self.run_one() {
            n += 1;
        }
        n
    }
}

impl Scheduler for Manual {
    fn schedule(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}
