//! # Concord
//!
//! **Concord** is a small concurrency library built around composable,
//! shared futures and continuations rather than `async` state machines.
//!
//! A computation is handed to a [`Scheduler`] and immediately returns a
//! [`Future`]. Work is then chained on that future, either on success with
//! [`then`](Future::then) or on any outcome with [`recover`](Future::recover),
//! and groups of futures are joined with [`when_all`]. Failures, including
//! panics, are captured where they happen and travel along the chain as an
//! [`Error`].
//!
//! Next to futures, the crate offers:
//!
//! - A **work-stealing thread pool** and two deterministic schedulers for tests
//! - A **progress tracker** counting completed tasks of a group
//! - **Channels** whose values flow through a pipeline of stateful
//!   [`Process`](channel::Process) stages
//!
//! ## Quick Start
//!
//! ```rust
//! use concord::{ThreadPoolBuilder, spawn, when_all};
//! use std::time::Duration;
//!
//! let pool = ThreadPoolBuilder::new().worker_threads(2).build();
//! let executor = pool.executor();
//!
//! let a = spawn(&executor, || 21).then(|x| x * 2);
//! let b = spawn(&executor, || 8);
//!
//! let total = when_all(&executor, |(a, b)| a + b, (a, b));
//!
//! let result = total.wait_timeout(Duration::from_secs(5));
//! assert_eq!(result.unwrap().unwrap(), 50);
//! ```
//!
//! ## Modules
//!
//! - [`scheduler`]: the scheduling capability and the provided schedulers
//! - [`future`]: futures, promises and task spawning
//! - [`combinator`]: continuations and joins
//! - [`progress`]: progress tracking
//! - [`channel`]: channels and process pipelines

pub mod channel;
pub mod combinator;
pub mod error;
pub mod future;
pub mod progress;
pub mod scheduler;

pub use channel::{Receiver, Sender, channel};
pub use combinator::{Join, join_all, when_all};
pub use error::{Error, ProcessError};
pub use future::{Future, Promise, Settled, package, spawn, try_spawn};
pub use progress::{ProgressTracker, ProgressTrackerBuilder};
pub use scheduler::{
    Executor, Immediate, Manual, Scheduler, Task, ThreadPool, ThreadPoolBuilder, default_executor,
};
