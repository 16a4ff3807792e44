use super::core::{Core, Outcome};
use super::package;
use crate::error::Error;
use crate::scheduler::Executor;

use std::fmt;
use std::future::IntoFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// A handle to the eventual result of an asynchronous computation.
///
/// Handles are cheap to clone and all clones observe the same result.
/// Dropping a handle never cancels the computation: the task still runs,
/// and continuations attached to it still fire. Use
/// [`detach`](Self::detach) to state that the result is not needed.
#[must_use = "futures do nothing observable unless polled, chained or detached"]
pub struct Future<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) core: Arc<Core<T>>,
}

impl<T> Future<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn from_core(core: Arc<Core<T>>) -> Self {
        Self { core }
    }

    /// Creates a future that is already settled with `value`.
    pub fn ready(executor: &Executor, value: T) -> Self {
        let (promise, future) = package(executor);
        promise.set_value(value);
        future
    }

    /// Creates a future that is already settled with `error`.
    pub fn failed(executor: &Executor, error: Error) -> Self {
        let (promise, future) = package(executor);
        promise.set_error(error);
        future
    }

    /// Polls the result without blocking.
    ///
    /// - `Ok(None)`: still pending,
    /// - `Ok(Some(value))`: settled with a value,
    /// - `Err(error)`: the computation failed; the stored error is returned.
    pub fn get_try(&self) -> Result<Option<T>, Error> {
        self.core.peek().transpose()
    }

    /// Returns `true` once the future has settled, with a value or an error.
    pub fn is_ready(&self) -> bool {
        self.core.is_settled()
    }

    /// Returns the stored error, if the future failed.
    pub fn error(&self) -> Option<Error> {
        self.core.peek().and_then(Result::err)
    }

    /// Blocks the calling thread until the future settles.
    ///
    /// Must not be called from a task running on a scheduler the awaited
    /// future depends on, or that scheduler may deadlock.
    pub fn wait(&self) -> Result<T, Error> {
        self.core.wait()
    }

    /// Blocks until the future settles or `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, Error>> {
        self.core.wait_timeout(timeout)
    }

    /// Executor used by continuations that don't name one.
    pub fn executor(&self) -> &Executor {
        self.core.executor()
    }

    /// Gives up interest in the result.
    ///
    /// The computation still runs to completion and continuations attached
    /// to this future still fire.
    pub fn detach(self) {
        tracing::trace!("future detached");
    }
}

impl<T> Clone for Future<T>
where
    T: Clone + Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> fmt::Debug for Future<T>
where
    T: Clone + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("outcome", &self.core.peek())
            .finish()
    }
}

/// Awaitable view of a [`Future`], obtained through `.await`.
pub struct Settled<T>
where
    T: Clone + Send + 'static,
{
    core: Arc<Core<T>>,
}

impl<T> std::future::Future for Settled<T>
where
    T: Clone + Send + 'static,
{
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.core.poll_outcome(cx)
    }
}

impl<T> IntoFuture for Future<T>
where
    T: Clone + Send + 'static,
{
    type Output = Result<T, Error>;
    type IntoFuture = Settled<T>;

    fn into_future(self) -> Self::IntoFuture {
        Settled { core: self.core }
    }
}
