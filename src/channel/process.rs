//! Process stages.
//!
//! A stage is an explicit state machine. The pipeline feeds it with
//! [`await_value`](Process::await_value), drains it with
//! [`yield_value`](Process::yield_value) for as long as its
//! [`state`](Process::state) is [`ProcessState::Yield`], and calls
//! [`close`](Process::close) once the upstream is exhausted.

use crate::error::ProcessError;

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::mem;
use std::ops::Add;

/// State of a [`Process`] stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Ready to accept the next value.
    Await,

    /// Holds a value for downstream; `yield_value` must be called.
    Yield,

    /// Closed and drained; no value will be accepted or produced again.
    Closed,
}

/// A stateful pipeline stage.
///
/// # Contract
///
/// - `await_value` after `close` is a violation and must return
///   [`ProcessError::AwaitAfterClose`],
/// - `yield_value` outside [`ProcessState::Yield`] must return
///   [`ProcessError::NothingToYield`],
/// - `close` is called at most once by the pipeline.
pub trait Process: Send + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Consumes one upstream value.
    fn await_value(&mut self, value: Self::Input) -> Result<(), ProcessError>;

    /// Produces one downstream value.
    fn yield_value(&mut self) -> Result<Self::Output, ProcessError>;

    /// Signals the end of the upstream.
    fn close(&mut self);

    fn state(&self) -> ProcessState;
}

/// Stateless transform: every value in yields one value out.
pub struct Map<F, T, U> {
    f: F,
    pending: VecDeque<T>,
    closed: bool,
    _marker: PhantomData<fn(T) -> U>,
}

/// Builds a [`Map`] stage from a closure.
pub fn map<F, T, U>(f: F) -> Map<F, T, U>
where
    F: FnMut(T) -> U + Send + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    Map {
        f,
        pending: VecDeque::new(),
        closed: false,
        _marker: PhantomData,
    }
}

impl<F, T, U> Process for Map<F, T, U>
where
    F: FnMut(T) -> U + Send + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    fn await_value(&mut self, value: T) -> Result<(), ProcessError> {
        if self.closed {
            return Err(ProcessError::AwaitAfterClose);
        }
        self.pending.push_back(value);
        Ok(())
    }

    fn yield_value(&mut self) -> Result<U, ProcessError> {
        let value = self.pending.pop_front().ok_or(ProcessError::NothingToYield)?;
        Ok((self.f)(value))
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn state(&self) -> ProcessState {
        if !self.pending.is_empty() {
            ProcessState::Yield
        } else if self.closed {
            ProcessState::Closed
        } else {
            ProcessState::Await
        }
    }
}

/// Accumulates every value and yields the total once, after close.
#[derive(Debug)]
pub struct Sum<T> {
    total: T,
    closed: bool,
    emitted: bool,
}

/// Builds a [`Sum`] stage starting from `T::default()`.
pub fn sum<T>() -> Sum<T>
where
    T: Add<Output = T> + Default + Send + 'static,
{
    Sum {
        total: T::default(),
        closed: false,
        emitted: false,
    }
}

impl<T> Process for Sum<T>
where
    T: Add<Output = T> + Default + Send + 'static,
{
    type Input = T;
    type Output = T;

    fn await_value(&mut self, value: T) -> Result<(), ProcessError> {
        if self.closed {
            return Err(ProcessError::AwaitAfterClose);
        }
        self.total = mem::take(&mut self.total) + value;
        Ok(())
    }

    fn yield_value(&mut self) -> Result<T, ProcessError> {
        if self.state() != ProcessState::Yield {
            return Err(ProcessError::NothingToYield);
        }
        self.emitted = true;
        Ok(mem::take(&mut self.total))
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn state(&self) -> ProcessState {
        match (self.closed, self.emitted) {
            (false, _) => ProcessState::Await,
            (true, false) => ProcessState::Yield,
            (true, true) => ProcessState::Closed,
        }
    }
}

/// Terminal stage running a closure on every value.
pub struct ForEach<F, T> {
    f: F,
    closed: bool,
    _marker: PhantomData<fn(T)>,
}

/// Builds a [`ForEach`] stage.
pub fn for_each<F, T>(f: F) -> ForEach<F, T>
where
    F: FnMut(T) + Send + 'static,
    T: Send + 'static,
{
    ForEach {
        f,
        closed: false,
        _marker: PhantomData,
    }
}

impl<F, T> Process for ForEach<F, T>
where
    F: FnMut(T) + Send + 'static,
    T: Send + 'static,
{
    type Input = T;
    type Output = ();

    fn await_value(&mut self, value: T) -> Result<(), ProcessError> {
        if self.closed {
            return Err(ProcessError::AwaitAfterClose);
        }
        (self.f)(value);
        Ok(())
    }

    fn yield_value(&mut self) -> Result<(), ProcessError> {
        Err(ProcessError::NothingToYield)
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn state(&self) -> ProcessState {
        if self.closed {
            ProcessState::Closed
        } else {
            ProcessState::Await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn sum_yields_once_after_close() {
        let mut stage = sum::<i32>();

        for n in [1, 2, 3, 4] {
            stage.await_value(n).unwrap();
            assert_eq!(stage.state(), ProcessState::Await);
        }

        stage.close();
        assert_eq!(stage.state(), ProcessState::Yield);
        assert_eq!(stage.yield_value(), Ok(10));
        assert_eq!(stage.state(), ProcessState::Closed);
        assert_eq!(stage.yield_value(), Err(ProcessError::NothingToYield));
    }

    #[test]
    fn sum_rejects_await_after_close() {
        let mut stage = sum::<i32>();
        stage.close();
        assert_eq!(stage.await_value(1), Err(ProcessError::AwaitAfterClose));

        let _ = stage.yield_value();
        assert_eq!(stage.await_value(1), Err(ProcessError::AwaitAfterClose));
    }

    #[test]
    fn map_yields_per_value() {
        let mut stage = map(|x: i32| x * 10);
        assert_eq!(stage.state(), ProcessState::Await);

        stage.await_value(4).unwrap();
        assert_eq!(stage.state(), ProcessState::Yield);
        assert_eq!(stage.yield_value(), Ok(40));
        assert_eq!(stage.state(), ProcessState::Await);

        stage.close();
        assert_eq!(stage.state(), ProcessState::Closed);
        assert_eq!(stage.await_value(1), Err(ProcessError::AwaitAfterClose));
    }

    #[test]
    fn for_each_never_yields() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let mut stage = for_each(move |x: u8| s.lock().push(x));

        stage.await_value(1).unwrap();
        stage.await_value(2).unwrap();
        assert_eq!(stage.state(), ProcessState::Await);
        assert_eq!(stage.yield_value(), Err(ProcessError::NothingToYield));
        assert_eq!(*seen.lock(), vec![1, 2]);
    }
}
