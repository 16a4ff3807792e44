use crate::error::Error;
use crate::future::{Future, catch, catch_fallible, package};
use crate::scheduler::Executor;

impl<T> Future<T>
where
    T: Clone + Send + 'static,
{
    /// Runs `f` with the value once this future succeeds.
    ///
    /// `f` is always scheduled on this future's executor, never run inline
    /// on the caller's stack, even if this future is already settled. If
    /// this future fails, `f` is dropped without running and the error is
    /// passed on to the returned future.
    pub fn then<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: Clone + Send + 'static,
    {
        self.then_on(self.executor(), f)
    }

    /// Like [`then`](Self::then), scheduling `f` on `executor`.
    pub fn then_on<F, R>(&self, executor: &Executor, f: F) -> Future<R>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: Clone + Send + 'static,
    {
        let (promise, future) = package(executor);
        let executor = executor.clone();

        self.core.on_settle(move |outcome| match outcome {
            Ok(value) => {
                let value = value.clone();
                executor.schedule(move || promise.fulfil(catch(|| f(value))));
            }
            Err(error) => promise.set_error(error.clone()),
        });

        future
    }

    /// Like [`then`](Self::then) for a fallible continuation; an `Err`
    /// returned by `f` fails the resulting future.
    pub fn try_then<F, R, E>(&self, f: F) -> Future<R>
    where
        F: FnOnce(T) -> Result<R, E> + Send + 'static,
        R: Clone + Send + 'static,
        E: Into<Error>,
    {
        let (promise, future) = package(self.executor());
        let executor = self.executor().clone();

        self.core.on_settle(move |outcome| match outcome {
            Ok(value) => {
                let value = value.clone();
                executor.schedule(move || promise.fulfil(catch_fallible(|| f(value))));
            }
            Err(error) => promise.set_error(error.clone()),
        });

        future
    }

    /// Runs `f` with the outcome of this future, success or failure.
    ///
    /// The returned future holds whatever `f` returns, so a failed chain
    /// can be turned back into a successful one.
    pub fn recover<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce(Result<T, Error>) -> R + Send + 'static,
        R: Clone + Send + 'static,
    {
        self.recover_on(self.executor(), f)
    }

    /// Like [`recover`](Self::recover), scheduling `f` on `executor`.
    pub fn recover_on<F, R>(&self, executor: &Executor, f: F) -> Future<R>
    where
        F: FnOnce(Result<T, Error>) -> R + Send + 'static,
        R: Clone + Send + 'static,
    {
        let (promise, future) = package(executor);
        let executor = executor.clone();

        self.core.on_settle(move |outcome| {
            let outcome = outcome.clone();
            executor.schedule(move || promise.fulfil(catch(|| f(outcome))));
        });

        future
    }
}
