use super::context::{WorkerContext, enter_worker};
use super::injector::Injector;
use super::queue::LocalQueue;
use crate::error::panic_message;
use crate::scheduler::Task;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A worker thread of a [`ThreadPool`](super::ThreadPool).
///
/// The execution order is:
/// 1. Pop from the local queue
/// 2. Take from the global injector
/// 3. Steal from other workers
/// 4. Park if no work is available
pub(crate) struct Worker {
    pool_id: usize,

    id: usize,

    /// All local queues (one per worker), used for stealing.
    locals: Arc<Vec<Arc<LocalQueue>>>,

    injector: Arc<Injector>,
}

impl Worker {
    pub(crate) fn new(
        pool_id: usize,
        id: usize,
        locals: Arc<Vec<Arc<LocalQueue>>>,
        injector: Arc<Injector>,
    ) -> Self {
        Self {
            pool_id,
            id,
            locals,
            injector,
        }
    }

    /// Runs the worker loop until the injector signals shutdown.
    pub(crate) fn run(self) {
        let ctx = WorkerContext {
            pool_id: self.pool_id,
            worker_id: self.id,
            locals: self.locals.clone(),
        };

        enter_worker(ctx, || {
            tracing::trace!(pool = self.pool_id, worker = self.id, "worker started");

            while !self.injector.is_shutdown() {
                if let Some(task) = self.next_task() {
                    self.execute(task);
                    continue;
                }

                self.injector.park();
            }

            tracing::trace!(pool = self.pool_id, worker = self.id, "worker stopped");
        });
    }

    fn next_task(&self) -> Option<Task> {
        self.locals[self.id]
            .pop()
            .or_else(|| self.injector.steal())
            .or_else(|| self.try_steal())
    }

    /// Runs a task, keeping the worker alive if it panics.
    ///
    /// Tasks built by this crate capture their own panics into the result
    /// slot of a future; this only catches raw tasks handed to the pool.
    fn execute(&self, task: Task) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            tracing::error!(
                pool = self.pool_id,
                worker = self.id,
                panic = %panic_message(payload),
                "task panicked on worker thread"
            );
        }
    }

    /// Attempts to steal a task from another worker's local queue,
    /// visiting victims round-robin.
    fn try_steal(&self) -> Option<Task> {
        let len = self.locals.len();

        if len <= 1 {
            return None;
        }

        (1..len)
            .map(|i| (self.id + i) % len)
            .find_map(|victim| self.locals[victim].steal())
    }
}
