//! Channels and process pipelines.
//!
//! [`channel`] creates a multi-producer, single-consumer conduit.
//! [`Sender`]s are cloned freely to fan values in; the [`Receiver`] is
//! piped through a chain of [`Process`] stages with `|`:
//!
//! ```rust
//! use concord::channel::{channel, map, sum};
//! use concord::{Executor, Immediate};
//!
//! let executor = Executor::new(Immediate);
//! let (sender, receiver) = channel::<i32>(&executor);
//!
//! let total = (receiver | map(|x: i32| x * 2) | sum()).collect();
//!
//! for n in 1..=4 {
//!     sender.send(n);
//! }
//! sender.close();
//!
//! assert_eq!(total.get_try().unwrap(), Some(vec![20]));
//! ```
//!
//! Values sent before the pipeline is ready are buffered. Pumping starts
//! with [`Receiver::set_ready`] and runs on the channel's executor, one
//! drain job at a time, so stages never run concurrently with themselves.
//! The close signal travels down the chain once every sender share has
//! been closed and the buffer is empty.

mod driver;
mod node;
mod process;

pub use process::{ForEach, Map, Process, ProcessState, Sum, for_each, map, sum};

use driver::Driver;
use node::{Node, Signal};

use crate::future::{Future, package};
use crate::scheduler::Executor;

use std::collections::VecDeque;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

struct ChannelState<T> {
    /// Values sent but not yet handed to the pipeline.
    queue: VecDeque<T>,

    /// Open sender shares.
    senders: usize,

    ready: bool,

    /// A drain job is scheduled or running.
    draining: bool,

    /// The close signal has been delivered.
    closed: bool,
}

/// Root of a pipeline: the buffer fed by senders.
struct Channel<T> {
    state: Mutex<ChannelState<T>>,

    /// First node of the pipeline.
    head: Arc<Node<T>>,

    executor: Executor,
}

impl<T: Send + 'static> Channel<T> {
    fn push(self: &Arc<Self>, value: T) {
        let mut state = self.state.lock();
        state.queue.push_back(value);
        self.kick(state);
    }

    fn add_sender(&self) {
        self.state.lock().senders += 1;
    }

    fn release_sender(self: &Arc<Self>) {
        let mut state = self.state.lock();
        state.senders -= 1;

        if state.senders == 0 {
            tracing::debug!(buffered = state.queue.len(), "last sender closed");
        }

        self.kick(state);
    }

    fn mark_ready(self: &Arc<Self>) {
        let mut state = self.state.lock();
        state.ready = true;
        self.kick(state);
    }

    /// Schedules a drain job if there is something to deliver and no job
    /// is already in flight.
    fn kick(self: &Arc<Self>, mut state: MutexGuard<'_, ChannelState<T>>) {
        if !state.ready || state.draining || state.closed {
            return;
        }

        if state.queue.is_empty() && state.senders > 0 {
            return;
        }

        state.draining = true;
        drop(state);

        let channel = self.clone();
        self.executor.schedule(move || channel.drain());
    }

    /// Delivers buffered values, then the close signal once every sender
    /// is gone.
    ///
    /// `draining` is cleared under the same lock that observes the empty
    /// queue, so a concurrent `push` either is seen here or kicks a new job.
    fn drain(&self) {
        loop {
            let signal = {
                let mut state = self.state.lock();

                if let Some(value) = state.queue.pop_front() {
                    Signal::Value(value)
                } else if state.senders == 0 && !state.closed {
                    state.closed = true;
                    Signal::Close
                } else {
                    state.draining = false;
                    return;
                }
            };

            self.head.deliver(signal);
        }
    }
}

/// Type-erased access to the root of a pipeline.
trait Control: Send + Sync + 'static {
    fn set_ready(self: Arc<Self>);

    fn executor(&self) -> &Executor;
}

impl<T: Send + 'static> Control for Channel<T> {
    fn set_ready(self: Arc<Self>) {
        self.mark_ready();
    }

    fn executor(&self) -> &Executor {
        &self.executor
    }
}

/// Creates a channel whose pipeline runs on `executor`.
pub fn channel<T>(executor: &Executor) -> (Sender<T>, Receiver<T>)
where
    T: Send + 'static,
{
    let head = Arc::new(Node::new());
    let channel = Arc::new(Channel {
        state: Mutex::new(ChannelState {
            queue: VecDeque::new(),
            senders: 1,
            ready: false,
            draining: false,
            closed: false,
        }),
        head: head.clone(),
        executor: executor.clone(),
    });

    let sender = Sender {
        channel: channel.clone(),
    };
    let receiver = Receiver {
        node: head,
        control: channel,
    };

    (sender, receiver)
}

/// Producing end of a channel.
///
/// Each clone is an independent share of the channel; the channel closes
/// once every share has been closed or dropped.
pub struct Sender<T: Send + 'static> {
    channel: Arc<Channel<T>>,
}

impl<T: Send + 'static> Sender<T> {
    /// Enqueues a value for delivery.
    pub fn send(&self, value: T) {
        self.channel.push(value);
    }

    /// Closes this share of the channel.
    pub fn close(self) {
        drop(self);
    }
}

impl<T: Send + 'static> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.channel.add_sender();
        Self {
            channel: self.channel.clone(),
        }
    }
}

impl<T: Send + 'static> Drop for Sender<T> {
    fn drop(&mut self) {
        self.channel.release_sender();
    }
}

impl<T: Send + 'static> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

/// Consuming end of a channel, or of a stage piped onto it.
///
/// A receiver is not cloneable: each point of a pipeline has exactly one
/// consumer.
#[must_use = "a receiver does nothing unless piped, collected or made ready"]
pub struct Receiver<T: Send + 'static> {
    node: Arc<Node<T>>,
    control: Arc<dyn Control>,
}

impl<T: Send + 'static> Receiver<T> {
    /// Pipes this receiver's values through `stage`.
    pub fn pipe<P>(self, stage: P) -> Receiver<P::Output>
    where
        P: Process<Input = T>,
    {
        let downstream = Arc::new(Node::new());
        let mut driver = Driver::new(stage, downstream.clone());

        self.node.attach(Box::new(move |signal| driver.handle(signal)));

        Receiver {
            node: downstream,
            control: self.control,
        }
    }

    /// Starts pumping the pipeline this receiver belongs to.
    ///
    /// Until then, sent values are only buffered. May be called on any
    /// receiver of the chain; calling it again has no effect.
    ///
    /// Values reaching a receiver that has neither been piped nor collected
    /// stay buffered at that receiver for as long as it lives; the first
    /// such value is reported with a warning.
    pub fn set_ready(&self) {
        self.node.mark_ready();
        self.control.clone().set_ready();
    }

    /// Gathers every value reaching this point into a future, and marks
    /// the pipeline ready.
    ///
    /// The future settles when the close signal arrives, or fails if a
    /// stage upstream violated its contract.
    pub fn collect(self) -> Future<Vec<T>>
    where
        T: Clone,
    {
        let (promise, future) = package(self.control.executor());
        let mut promise = Some(promise);
        let mut values = Vec::new();

        self.node.attach(Box::new(move |signal| match signal {
            Signal::Value(value) => values.push(value),
            Signal::Close => {
                if let Some(promise) = promise.take() {
                    promise.set_value(std::mem::take(&mut values));
                }
            }
            Signal::Fail(error) => {
                if let Some(promise) = promise.take() {
                    promise.set_error(error);
                }
            }
        }));

        self.set_ready();
        future
    }
}

impl<T, P> BitOr<P> for Receiver<T>
where
    T: Send + 'static,
    P: Process<Input = T>,
{
    type Output = Receiver<P::Output>;

    fn bitor(self, stage: P) -> Self::Output {
        self.pipe(stage)
    }
}

impl<T: Send + 'static> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}
