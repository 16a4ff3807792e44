use super::core::Outcome;
use super::{Future, package};
use crate::error::Error;
use crate::scheduler::Executor;

use std::panic::{self, AssertUnwindSafe};

/// Runs `f`, turning a panic into an [`Error::Panicked`].
pub(crate) fn catch<F, R>(f: F) -> Outcome<R>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let error = Error::from_panic(payload);
        tracing::warn!(%error, "task panicked");
        error
    })
}

/// Runs a fallible `f`, flattening its error into the outcome.
pub(crate) fn catch_fallible<F, R, E>(f: F) -> Outcome<R>
where
    F: FnOnce() -> Result<R, E>,
    E: Into<Error>,
{
    catch(f).and_then(|result| result.map_err(Into::into))
}

/// Schedules `f` on `executor` and returns a future of its result.
///
/// Returns immediately. The value returned by `f`, or the panic it raises,
/// settles the future on the executor's thread.
///
/// # Examples
///
/// ```rust
/// use concord::{Immediate, Executor, spawn};
///
/// let executor = Executor::new(Immediate);
/// let answer = spawn(&executor, || 42);
/// assert_eq!(answer.get_try().unwrap(), Some(42));
/// ```
pub fn spawn<F, R>(executor: &Executor, f: F) -> Future<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Clone + Send + 'static,
{
    let (promise, future) = package(executor);
    executor.schedule(move || promise.fulfil(catch(f)));
    future
}

/// Schedules a fallible `f`; an `Err` settles the future with that error.
pub fn try_spawn<F, R, E>(executor: &Executor, f: F) -> Future<R>
where
    F: FnOnce() -> Result<R, E> + Send + 'static,
    R: Clone + Send + 'static,
    E: Into<Error>,
{
    let (promise, future) = package(executor);
    executor.schedule(move || promise.fulfil(catch_fallible(f)));
    future
}
