//! Work-stealing thread pool.
//!
//! The pool is made of:
//! - [`injector`]: a global queue for tasks scheduled from outside the pool,
//! - [`queue`]: per-worker local queues used for fast local execution
//!   and stealing,
//! - [`worker`]: the worker loop,
//! - [`context`]: thread-local state telling a worker which pool it serves.
//!
//! Tasks scheduled from a worker thread of the same pool land on that
//! worker's local queue; everything else goes through the injector.

mod builder;
mod context;
mod core;
mod injector;
mod queue;
mod worker;

pub use builder::ThreadPoolBuilder;
pub use self::core::ThreadPool;
