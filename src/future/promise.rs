use super::Future;
use super::core::{Core, Outcome};
use crate::error::Error;
use crate::scheduler::Executor;

use std::sync::Arc;

/// The writing end of a [`Future`].
///
/// A promise settles its future at most once. Dropping an unfulfilled
/// promise settles the future with [`Error::BrokenPromise`], so a task
/// that is discarded before running never leaves its future pending.
#[must_use = "dropping a promise breaks it"]
pub struct Promise<T>
where
    T: Clone + Send + 'static,
{
    core: Option<Arc<Core<T>>>,
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// Settles the future with a value.
    pub fn set_value(self, value: T) {
        self.fulfil(Ok(value));
    }

    /// Settles the future with an error.
    pub fn set_error(self, error: Error) {
        self.fulfil(Err(error));
    }

    pub(crate) fn fulfil(mut self, outcome: Outcome<T>) {
        if let Some(core) = self.core.take() {
            core.settle(outcome);
        }
    }
}

impl<T> Drop for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(core) = self.core.take() {
            tracing::debug!("promise dropped before being fulfilled");
            core.settle(Err(Error::BrokenPromise));
        }
    }
}

/// Creates a connected promise/future pair.
///
/// Continuations attached to the future without an explicit executor are
/// scheduled on `executor`.
pub fn package<T>(executor: &Executor) -> (Promise<T>, Future<T>)
where
    T: Clone + Send + 'static,
{
    let core = Arc::new(Core::new(executor.clone()));
    let promise = Promise {
        core: Some(core.clone()),
    };

    (promise, Future::from_core(core))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Immediate;

    #[test]
    fn dropped_promise_breaks_future() {
        let (promise, future) = package::<u8>(&Executor::new(Immediate));
        drop(promise);
        assert!(matches!(future.get_try(), Err(Error::BrokenPromise)));
    }

    #[test]
    fn set_value_settles() {
        let (promise, future) = package(&Executor::new(Immediate));
        assert!(matches!(future.get_try(), Ok(None)));
        promise.set_value("done");
        assert!(matches!(future.get_try(), Ok(Some("done"))));
    }
}
