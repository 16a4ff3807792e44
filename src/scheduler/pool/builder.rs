use super::ThreadPool;

use std::thread;

/// Builder for configuring and creating a [`ThreadPool`].
///
/// # Examples
///
/// ```rust
/// use concord::ThreadPoolBuilder;
///
/// let pool = ThreadPoolBuilder::new()
///     .worker_threads(2)
///     .thread_name("io")
///     .build();
/// assert_eq!(pool.worker_threads(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ThreadPoolBuilder {
    /// Number of worker threads.
    worker_threads: usize,

    /// Prefix of worker thread names, suffixed with the worker index.
    thread_name: String,
}

impl ThreadPoolBuilder {
    /// Creates a builder with default configuration.
    ///
    /// By default, the number of worker threads is the number of available
    /// logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name: String::from("concord-pool"),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the prefix used to name worker threads.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Spawns the worker threads and returns the pool.
    pub fn build(self) -> ThreadPool {
        ThreadPool::new(self.worker_threads, &self.thread_name)
    }
}

impl Default for ThreadPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
