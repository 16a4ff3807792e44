use crate::error::Error;
use crate::scheduler::Executor;

use std::collections::VecDeque;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Settled value of a future.
pub(crate) type Outcome<T> = Result<T, Error>;

/// A callback run once the core settles.
type Callback<T> = Box<dyn FnOnce(&Outcome<T>) + Send + 'static>;

struct State<T> {
    /// Empty while pending; written exactly once.
    slot: Option<Outcome<T>>,

    /// Callbacks waiting for the slot, in registration order.
    callbacks: VecDeque<Callback<T>>,

    /// Set while the settling thread is draining `callbacks`.
    firing: bool,

    /// Wakers of `.await`ing tasks.
    wakers: Vec<Waker>,
}

/// Shared state behind every handle of one future.
///
/// The core is reference counted: it is kept alive by its [`Future`]
/// handles, by the [`Promise`] that will settle it and by callbacks
/// registered on upstream cores. All transitions go through the state
/// mutex; the only mutation after creation is the single
/// pending-to-settled transition performed by [`Core::settle`].
///
/// [`Future`]: crate::Future
/// [`Promise`]: crate::Promise
pub(crate) struct Core<T> {
    state: Mutex<State<T>>,

    /// Signalled on settlement, for blocking waits.
    settled: Condvar,

    /// Scheduler used by continuations that don't name one.
    executor: Executor,
}

impl<T> Core<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new(executor: Executor) -> Self {
        Self {
            state: Mutex::new(State {
                slot: None,
                callbacks: VecDeque::new(),
                firing: false,
                wakers: Vec::new(),
            }),
            settled: Condvar::new(),
            executor,
        }
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Stores the outcome and fires the registered callbacks.
    ///
    /// Returns `false` if the core was already settled, in which case
    /// `outcome` is discarded.
    ///
    /// Callbacks run on the calling thread, in registration order.
    /// Callbacks registered while this drain is in progress are appended
    /// and run by the same drain, so registration order holds even under
    /// concurrent registration.
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        let (snapshot, wakers) = {
            let mut state = self.state.lock();

            if state.slot.is_some() {
                return false;
            }

            let snapshot = if state.callbacks.is_empty() {
                None
            } else {
                state.firing = true;
                Some(outcome.clone())
            };

            state.slot = Some(outcome);
            (snapshot, std::mem::take(&mut state.wakers))
        };

        self.settled.notify_all();

        for waker in wakers {
            waker.wake();
        }

        if let Some(outcome) = snapshot {
            loop {
                let next = {
                    let mut state = self.state.lock();
                    let next = state.callbacks.pop_front();
                    if next.is_none() {
                        state.firing = false;
                    }
                    next
                };

                match next {
                    Some(callback) => callback(&outcome),
                    None => break,
                }
            }
        }

        true
    }

    /// Registers a callback for the settled outcome.
    ///
    /// If the core is already settled and no drain is running, the
    /// callback runs immediately on the calling thread.
    pub(crate) fn on_settle<F>(&self, callback: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let mut state = self.state.lock();

        if state.firing || state.slot.is_none() {
            state.callbacks.push_back(Box::new(callback));
            return;
        }

        let outcome = state.slot.clone();
        drop(state);

        if let Some(outcome) = outcome {
            callback(&outcome);
        }
    }

    /// Returns a copy of the outcome, if settled.
    pub(crate) fn peek(&self) -> Option<Outcome<T>> {
        self.state.lock().slot.clone()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.state.lock().slot.is_some()
    }

    /// Polls for the outcome, registering the waker if still pending.
    ///
    /// Checking and registering happen under the same lock as
    /// settlement, so a wake-up cannot be missed.
    pub(crate) fn poll_outcome(&self, cx: &mut Context<'_>) -> Poll<Outcome<T>> {
        let mut state = self.state.lock();

        if let Some(outcome) = &state.slot {
            return Poll::Ready(outcome.clone());
        }

        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }

        Poll::Pending
    }

    /// Blocks the calling thread until the core settles.
    pub(crate) fn wait(&self) -> Outcome<T> {
        let mut state = self.state.lock();

        loop {
            if let Some(outcome) = &state.slot {
                return outcome.clone();
            }
            self.settled.wait(&mut state);
        }
    }

    /// Blocks until the core settles or `timeout` elapses.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(outcome) = &state.slot {
                return Some(outcome.clone());
            }
            if self.settled.wait_until(&mut state, deadline).timed_out() {
                return state.slot.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Immediate;
    use std::sync::Arc;

    fn core() -> Core<i32> {
        Core::new(Executor::new(Immediate))
    }

    #[test]
    fn settles_exactly_once() {
        let core = core();
        assert!(core.settle(Ok(1)));
        assert!(!core.settle(Ok(2)));
        assert!(!core.settle(Err(Error::BrokenPromise)));
        assert!(matches!(core.peek(), Some(Ok(1))));
    }

    #[test]
    fn callbacks_fire_in_registration_order() {
        let core = core();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let order = order.clone();
            core.on_settle(move |_| order.lock().push(i));
        }

        assert!(order.lock().is_empty());
        core.settle(Ok(0));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn late_callback_runs_immediately() {
        let core = core();
        core.settle(Ok(9));

        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        core.on_settle(move |outcome| {
            *s.lock() = outcome.as_ref().ok().copied();
        });

        assert_eq!(*seen.lock(), Some(9));
    }

    #[test]
    fn callback_registered_during_drain_runs_last() {
        let core = Arc::new(core());
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner = core.clone();
        let o = order.clone();
        core.on_settle(move |_| {
            o.lock().push("first");
            let o = o.clone();
            inner.on_settle(move |_| o.lock().push("nested"));
        });

        let o = order.clone();
        core.on_settle(move |_| o.lock().push("second"));

        core.settle(Ok(1));
        assert_eq!(*order.lock(), vec!["first", "second", "nested"]);
    }

    #[test]
    fn wait_timeout_expires_when_pending() {
        let core = core();
        assert!(core.wait_timeout(Duration::from_millis(5)).is_none());
    }
}
