//! Error types carried through futures and pipelines.
//!
//! A failed computation never unwinds across the scheduler. Its failure is
//! captured where it happened and stored in the future's result slot as an
//! [`Error`], from where it flows into every continuation, combinator and
//! caller of [`get_try`](crate::Future::get_try).

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// Failure stored in a settled future.
///
/// `Error` is cheap to clone because a single upstream failure is handed
/// to every continuation registered on that future.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The task returned an error.
    #[error("task failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The task panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The promise feeding this future was dropped without a value.
    #[error("broken promise")]
    BrokenPromise,

    /// A pipeline stage violated its contract.
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// Free-form failure.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Wraps any error value as a task failure.
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Failed(Arc::new(error))
    }

    /// Builds a free-form failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Converts a caught panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Error::Panicked(panic_message(payload))
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Message(message.to_string())
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Message(message)
    }
}

/// Contract violations reported by a [`Process`](crate::channel::Process) stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// `await_value` was called after the stage was closed.
    #[error("stage received a value after close")]
    AwaitAfterClose,

    /// `yield_value` was called while the stage had nothing to yield.
    #[error("stage has nothing to yield")]
    NothingToYield,

    /// User code inside the stage panicked.
    #[error("stage panicked: {0}")]
    Panicked(String),
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
