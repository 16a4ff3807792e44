//! Progress tracking for groups of tasks.
//!
//! A [`ProgressTracker`] wraps task bodies so that finishing one of them
//! bumps a shared completed-count and, optionally, notifies an observer
//! with `(task_number, done_tasks)`.
//!
//! ```rust
//! use concord::{Executor, Immediate, ProgressTracker, spawn};
//!
//! let executor = Executor::new(Immediate);
//! let tracker = ProgressTracker::new();
//!
//! let f = spawn(&executor, tracker.wrap(|| 42))
//!     .then(tracker.wrap_continuation(|x: i32| x + 42));
//!
//! assert_eq!(f.get_try().unwrap(), Some(84));
//! assert_eq!(tracker.completed(), 2);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Observer invoked with `(task_number, done_tasks)`.
type Observer = Box<dyn Fn(usize, usize) + Send + Sync + 'static>;

struct Inner {
    task_number: AtomicUsize,

    done_tasks: AtomicUsize,

    /// When set, wrapping a task does not grow `task_number`.
    fixed_total: bool,

    observer: Option<Observer>,
}

impl Inner {
    fn register(&self) {
        if !self.fixed_total {
            self.task_number.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn finish(&self) {
        let done = self.done_tasks.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(observer) = &self.observer {
            observer(self.task_number.load(Ordering::Acquire), done);
        }
    }
}

/// Marks a task done when dropped, so a panicking task still counts.
struct Completion<'a>(&'a Inner);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Counts completed tasks out of the tasks it has wrapped.
///
/// Clones share the same counters. Counting is safe from any number of
/// threads; the observer is called synchronously on the thread that
/// finishes each task.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Inner>,
}

impl ProgressTracker {
    /// Creates a tracker that counts silently.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a tracker notifying `observer` after each completed task.
    pub fn with_observer<F>(observer: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        Self::builder().observer(observer).build()
    }

    /// Returns a builder for a customised tracker.
    pub fn builder() -> ProgressTrackerBuilder {
        ProgressTrackerBuilder::default()
    }

    /// Wraps a task body.
    ///
    /// The returned closure counts as done once it has run.
    pub fn wrap<F, R>(&self, f: F) -> impl FnOnce() -> R + Send + 'static + use<F, R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: 'static,
    {
        self.inner.register();
        let inner = self.inner.clone();

        move || {
            let _done = Completion(&inner);
            f()
        }
    }

    /// Wraps a continuation body taking one argument.
    ///
    /// A wrapped continuation that never runs, for instance because its
    /// upstream failed, is never counted as done.
    pub fn wrap_continuation<F, A, R>(
        &self,
        f: F,
    ) -> impl FnOnce(A) -> R + Send + 'static + use<F, A, R>
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: 'static,
        R: 'static,
    {
        self.inner.register();
        let inner = self.inner.clone();

        move |arg| {
            let _done = Completion(&inner);
            f(arg)
        }
    }

    /// Total number of tracked tasks.
    pub fn task_number(&self) -> usize {
        self.inner.task_number.load(Ordering::Acquire)
    }

    /// Number of tasks that have finished.
    pub fn completed(&self) -> usize {
        self.inner.done_tasks.load(Ordering::Acquire)
    }

    /// Completed share of the total, in `[0, 1]`; `0` when nothing is tracked.
    pub fn fraction(&self) -> f64 {
        let total = self.task_number();

        if total == 0 {
            return 0.0;
        }

        (self.completed() as f64 / total as f64).min(1.0)
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("task_number", &self.task_number())
            .field("done_tasks", &self.completed())
            .field("observer", &self.inner.observer.is_some())
            .finish()
    }
}

/// Builder for a [`ProgressTracker`].
///
/// ```rust
/// use concord::ProgressTracker;
///
/// let tracker = ProgressTracker::builder()
///     .total(10)
///     .observer(|total, done| println!("{done}/{total} tasks performed."))
///     .build();
/// assert_eq!(tracker.task_number(), 10);
/// ```
#[derive(Default)]
pub struct ProgressTrackerBuilder {
    total: Option<usize>,
    observer: Option<Observer>,
}

impl ProgressTrackerBuilder {
    /// Fixes the total instead of growing it with each wrapped task.
    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Sets the observer called after each completed task.
    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn build(self) -> ProgressTracker {
        ProgressTracker {
            inner: Arc::new(Inner {
                task_number: AtomicUsize::new(self.total.unwrap_or(0)),
                done_tasks: AtomicUsize::new(0),
                fixed_total: self.total.is_some(),
                observer: self.observer,
            }),
        }
    }
}
