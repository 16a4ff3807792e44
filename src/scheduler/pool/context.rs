use super::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;

/// Identity of the worker running on the current thread.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    /// Identifier of the pool the worker belongs to.
    pub(crate) pool_id: usize,

    /// Index of the worker inside its pool.
    pub(crate) worker_id: usize,

    /// All local queues of the pool.
    pub(crate) locals: Arc<Vec<Arc<LocalQueue>>>,
}

thread_local! {
    /// Set for the whole lifetime of a worker thread.
    static CURRENT_WORKER: RefCell<Option<WorkerContext>> = const { RefCell::new(None) };
}

/// Installs the worker context for the current thread while `f` runs.
pub(crate) fn enter_worker<R>(ctx: WorkerContext, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_WORKER.with(|cell| cell.replace(Some(ctx)));
    let out = f();
    CURRENT_WORKER.with(|cell| cell.replace(prev));
    out
}

/// Runs `f` with the current worker context, if this thread is a worker
/// of pool `pool_id`.
pub(crate) fn with_worker<R>(pool_id: usize, f: impl FnOnce(&WorkerContext) -> R) -> Option<R> {
    CURRENT_WORKER.with(|cell| match cell.borrow().as_ref() {
        Some(ctx) if ctx.pool_id == pool_id => Some(f(ctx)),
        _ => None,
    })
}
