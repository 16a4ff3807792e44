use super::context::with_worker;
use super::injector::Injector;
use super::queue::LocalQueue;
use super::worker::Worker;
use crate::scheduler::{Executor, Scheduler, Task};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// State shared between the pool owner, its workers and executor handles.
struct PoolShared {
    id: usize,

    /// Global injector queue shared by all workers.
    injector: Arc<Injector>,

    /// One local queue per worker.
    locals: Arc<Vec<Arc<LocalQueue>>>,
}

impl Scheduler for PoolShared {
    fn schedule(&self, task: Task) {
        if self.injector.is_shutdown() {
            tracing::debug!(pool = self.id, "task scheduled after shutdown was dropped");
            drop(task);
            return;
        }

        // Local queue first for cache locality, when called from one of our workers.
        let refused = match with_worker(self.id, |ctx| ctx.locals[ctx.worker_id].clone()) {
            Some(local) => {
                local.push(task);
                None
            }
            None => self.injector.push(task).err(),
        };

        // Lost the race with shutdown; dropping breaks the task's promise.
        if let Some(task) = refused {
            tracing::debug!(pool = self.id, "task scheduled after shutdown was dropped");
            drop(task);
        }
    }
}

/// Multi-threaded, work-stealing [`Scheduler`].
///
/// Dropping the pool stops the workers, joins them and drops every task
/// still queued; futures fed by those tasks settle with
/// [`Error::BrokenPromise`](crate::Error::BrokenPromise).
pub struct ThreadPool {
    shared: Arc<PoolShared>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub(crate) fn new(threads: usize, name: &str) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let injector = Arc::new(Injector::new());

        let locals: Arc<Vec<Arc<LocalQueue>>> =
            Arc::new((0..threads).map(|_| Arc::new(LocalQueue::new())).collect());

        let shared = Arc::new(PoolShared {
            id,
            injector: injector.clone(),
            locals: locals.clone(),
        });

        let handles = (0..threads)
            .map(|worker_id| {
                let worker = Worker::new(id, worker_id, locals.clone(), injector.clone());

                thread::Builder::new()
                    .name(format!("{name}-{worker_id}"))
                    .spawn(move || worker.run())
                    .unwrap_or_else(|err| panic!("failed to spawn worker thread: {err}"))
            })
            .collect();

        tracing::debug!(pool = id, threads, "thread pool started");

        Self { shared, handles }
    }

    /// Returns a cloneable executor handle scheduling onto this pool.
    ///
    /// The handle stays valid after the pool is dropped; tasks scheduled
    /// through it from then on are dropped.
    pub fn executor(&self) -> Executor {
        Executor::from_arc(self.shared.clone())
    }

    /// Number of worker threads.
    pub fn worker_threads(&self) -> usize {
        self.shared.locals.len()
    }

    /// Schedules a closure on the pool.
    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule(Box::new(task));
    }
}

impl Drop for ThreadPool {
    /// Shuts the pool down.
    ///
    /// 1. Signals every worker to stop
    /// 2. Joins the workers (except the current thread, if it is one)
    /// 3. Drops all tasks left in the queues
    fn drop(&mut self) {
        let shared = &self.shared;
        shared.injector.shutdown();

        let current = with_worker(shared.id, |ctx| ctx.worker_id);

        for (worker_id, handle) in self.handles.drain(..).enumerate() {
            if Some(worker_id) == current {
                continue;
            }
            let _ = handle.join();
        }

        let mut leftover = shared.injector.drain();
        for local in shared.locals.iter() {
            leftover.extend(local.drain());
        }

        if !leftover.is_empty() {
            tracing::debug!(pool = shared.id, dropped = leftover.len(), "dropping unrun tasks");
        }
        drop(leftover);

        tracing::debug!(pool = shared.id, "thread pool stopped");
    }
}
