//! Scheduling capability.
//!
//! Every asynchronous operation in this crate ends in a call to
//! [`Scheduler::schedule`]. Futures carry an [`Executor`], a cheap
//! type-erased handle to some scheduler, so continuations can be placed on
//! the same scheduler as their upstream by default.
//!
//! Provided schedulers:
//! - [`ThreadPool`]: a work-stealing pool of worker threads,
//! - [`Immediate`]: runs tasks inline on the calling thread,
//! - [`Manual`]: queues tasks until the owner drives them.

mod immediate;
mod manual;

pub mod pool;

pub use immediate::Immediate;
pub use manual::Manual;
pub use pool::{ThreadPool, ThreadPoolBuilder};

use std::fmt;
use std::sync::{Arc, OnceLock};

/// A unit of work accepted by a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks asynchronously.
///
/// No ordering is guaranteed between independently scheduled tasks.
pub trait Scheduler: Send + Sync + 'static {
    /// Accepts a task for execution.
    ///
    /// A scheduler that drops a task without running it must drop it
    /// normally, so that any promise it owns is released.
    fn schedule(&self, task: Task);
}

/// Shared handle to a [`Scheduler`].
#[derive(Clone)]
pub struct Executor {
    inner: Arc<dyn Scheduler>,
}

impl Executor {
    /// Wraps a scheduler into a shareable handle.
    pub fn new<S: Scheduler>(scheduler: S) -> Self {
        Self {
            inner: Arc::new(scheduler),
        }
    }

    /// Builds a handle from an already shared scheduler.
    pub fn from_arc(inner: Arc<dyn Scheduler>) -> Self {
        Self { inner }
    }

    /// Schedules a closure.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.schedule(Box::new(task));
    }

    /// Schedules an already boxed task.
    pub fn schedule_boxed(&self, task: Task) {
        self.inner.schedule(task);
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

static DEFAULT_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Returns the process-wide default executor.
///
/// The backing pool is created on first use with one worker per available
/// CPU and lives for the rest of the process.
pub fn default_executor() -> Executor {
    DEFAULT_POOL
        .get_or_init(|| {
            ThreadPoolBuilder::new()
                .thread_name("concord-worker")
                .build()
        })
        .executor()
}
