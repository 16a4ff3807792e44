use super::node::{Node, Signal};
use super::process::{Process, ProcessState};
use crate::error::{Error, ProcessError, panic_message};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Runs stage code, turning a panic into a contract error.
fn guarded<R>(f: impl FnOnce() -> Result<R, ProcessError>) -> Result<R, ProcessError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(ProcessError::Panicked(panic_message(payload))))
}

/// Pumps signals from an upstream node through one stage.
pub(crate) struct Driver<P: Process> {
    stage: P,
    downstream: Arc<Node<P::Output>>,

    /// Set once the stage was closed or failed.
    done: bool,
}

impl<P: Process> Driver<P> {
    pub(crate) fn new(stage: P, downstream: Arc<Node<P::Output>>) -> Self {
        Self {
            stage,
            downstream,
            done: false,
        }
    }

    pub(crate) fn handle(&mut self, signal: Signal<P::Input>) {
        if self.done {
            return;
        }

        match signal {
            Signal::Value(value) => match guarded(|| self.stage.await_value(value)) {
                Ok(()) => self.flush(),
                Err(error) => self.fail(error),
            },
            Signal::Close => {
                let closed = guarded(|| {
                    self.stage.close();
                    Ok(())
                });

                if let Err(error) = closed {
                    self.fail(error);
                    return;
                }

                self.flush();

                if !self.done {
                    self.done = true;
                    tracing::trace!("pipeline stage closed");
                    self.downstream.deliver(Signal::Close);
                }
            }
            Signal::Fail(error) => {
                self.done = true;
                self.downstream.deliver(Signal::Fail(error));
            }
        }
    }

    /// Forwards every value the stage is ready to yield.
    fn flush(&mut self) {
        while !self.done && self.stage.state() == ProcessState::Yield {
            match guarded(|| self.stage.yield_value()) {
                Ok(value) => self.downstream.deliver(Signal::Value(value)),
                Err(error) => self.fail(error),
            }
        }
    }

    fn fail(&mut self, error: ProcessError) {
        tracing::error!(%error, "pipeline stage violated its contract");
        self.done = true;
        self.downstream.deliver(Signal::Fail(Error::Process(error)));
    }
}
