use crate::error::Error;
use crate::future::{Future, Promise, package};
use crate::scheduler::Executor;

use std::sync::Arc;

use parking_lot::Mutex;

/// A group of futures that can be awaited together.
///
/// Implemented for tuples of futures (arity 1 to 8), producing a tuple of
/// values, and for `Vec<Future<T>>`, producing a `Vec<T>` in input order.
pub trait Join {
    /// Values produced once every member has succeeded.
    type Output: Clone + Send + 'static;

    /// Combines the members into one future.
    ///
    /// If members fail, the combined future fails with the error of the
    /// failing member of lowest index. It settles as soon as that member
    /// and every member before it have settled, without waiting for the
    /// members after it; those keep running, but their outcomes are
    /// ignored.
    fn join(self, executor: &Executor) -> Future<Self::Output>;
}

/// Storage for member values until every member has succeeded.
trait Slots: Send + 'static {
    type Output: Clone + Send + 'static;

    /// Moves every value out, if all are present.
    fn take_all(&mut self) -> Option<Self::Output>;
}

impl<T> Slots for Vec<Option<T>>
where
    T: Clone + Send + 'static,
{
    type Output = Vec<T>;

    fn take_all(&mut self) -> Option<Vec<T>> {
        self.drain(..).collect()
    }
}

/// Settlement of one member, as seen by the gather.
enum Status {
    Pending,
    Succeeded,
    Failed(Error),
}

struct Gather<S: Slots> {
    slots: S,

    /// One entry per member, by index.
    status: Vec<Status>,

    /// Members that have not succeeded yet.
    remaining: usize,

    /// Taken by whichever member settles the combined future.
    promise: Option<Promise<S::Output>>,
}

impl<S: Slots> Gather<S> {
    fn new(slots: S, members: usize, promise: Promise<S::Output>) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            slots,
            status: (0..members).map(|_| Status::Pending).collect(),
            remaining: members,
            promise: Some(promise),
        }))
    }

    /// The error of the lowest failing member, once every member before
    /// it has settled.
    fn decided_failure(&self) -> Option<Error> {
        for status in &self.status {
            match status {
                Status::Pending => return None,
                Status::Succeeded => {}
                Status::Failed(error) => return Some(error.clone()),
            }
        }
        None
    }
}

/// Registers member `index` with the gather; `store` writes its value into
/// the member's slot.
fn attach<S, T, F>(gather: &Arc<Mutex<Gather<S>>>, index: usize, member: &Future<T>, store: F)
where
    S: Slots,
    T: Clone + Send + 'static,
    F: FnOnce(&mut S, T) + Send + 'static,
{
    let gather = gather.clone();

    member.core.on_settle(move |outcome| {
        let mut state = gather.lock();

        if state.promise.is_none() {
            return;
        }

        match outcome {
            Ok(value) => {
                store(&mut state.slots, value.clone());
                state.status[index] = Status::Succeeded;
                state.remaining -= 1;

                if state.remaining == 0 {
                    let promise = state.promise.take();
                    let values = state.slots.take_all();
                    drop(state);

                    if let (Some(promise), Some(values)) = (promise, values) {
                        promise.set_value(values);
                    }
                    return;
                }
            }
            Err(error) => state.status[index] = Status::Failed(error.clone()),
        }

        let Some(error) = state.decided_failure() else {
            return;
        };

        let promise = state.promise.take();
        drop(state);

        if let Some(promise) = promise {
            tracing::trace!(%error, "join failed");
            promise.set_error(error);
        }
    });
}

impl<T> Join for Vec<Future<T>>
where
    T: Clone + Send + 'static,
{
    type Output = Vec<T>;

    fn join(self, executor: &Executor) -> Future<Vec<T>> {
        let (promise, future) = package(executor);

        if self.is_empty() {
            promise.set_value(Vec::new());
            return future;
        }

        let gather = Gather::new(vec![None; self.len()], self.len(), promise);

        for (index, member) in self.iter().enumerate() {
            attach(&gather, index, member, move |slots: &mut Vec<Option<T>>, value| {
                slots[index] = Some(value);
            });
        }

        future
    }
}

macro_rules! impl_join_tuple {
    ($len:expr; $($T:ident $member:ident $idx:tt),+) => {
        impl<$($T),+> Slots for ($(Option<$T>,)+)
        where
            $($T: Clone + Send + 'static),+
        {
            type Output = ($($T,)+);

            fn take_all(&mut self) -> Option<Self::Output> {
                match ($(self.$idx.take(),)+) {
                    ($(Some($member),)+) => Some(($($member,)+)),
                    _ => None,
                }
            }
        }

        impl<$($T),+> Join for ($(Future<$T>,)+)
        where
            $($T: Clone + Send + 'static),+
        {
            type Output = ($($T,)+);

            fn join(self, executor: &Executor) -> Future<Self::Output> {
                let (promise, future) = package(executor);
                let gather = Gather::new(($(None::<$T>,)+), $len, promise);
                let ($($member,)+) = self;

                $(
                    attach(&gather, $idx, &$member, |slots, value| slots.$idx = Some(value));
                )+

                future
            }
        }
    };
}

impl_join_tuple!(1; A a 0);
impl_join_tuple!(2; A a 0, B b 1);
impl_join_tuple!(3; A a 0, B b 1, C c 2);
impl_join_tuple!(4; A a 0, B b 1, C c 2, D d 3);
impl_join_tuple!(5; A a 0, B b 1, C c 2, D d 3, E e 4);
impl_join_tuple!(6; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);
impl_join_tuple!(7; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6);
impl_join_tuple!(8; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7);

/// Runs `f` with the values of `futures` once all of them have succeeded.
///
/// `futures` is either a tuple of futures, in which case `f` receives a
/// tuple of values, or a `Vec` of futures, in which case `f` receives the
/// values in input order regardless of completion order. An empty `Vec`
/// resolves immediately and `f` receives an empty `Vec`.
///
/// If any member fails, `f` never runs and the result fails with the error
/// of the failing member of lowest index, whatever order members settle in.
///
/// # Examples
///
/// ```rust
/// use concord::{Executor, Immediate, spawn, when_all};
///
/// let executor = Executor::new(Immediate);
/// let a = spawn(&executor, || 10);
/// let b = spawn(&executor, || 20);
///
/// let sum = when_all(&executor, |(x, y)| x + y, (a, b));
/// assert_eq!(sum.get_try().unwrap(), Some(30));
/// ```
pub fn when_all<J, F, R>(executor: &Executor, f: F, futures: J) -> Future<R>
where
    J: Join,
    F: FnOnce(J::Output) -> R + Send + 'static,
    R: Clone + Send + 'static,
{
    futures.join(executor).then_on(executor, f)
}

/// Collects the values of `futures`, in input order.
pub fn join_all<I, T>(executor: &Executor, futures: I) -> Future<Vec<T>>
where
    I: IntoIterator<Item = Future<T>>,
    T: Clone + Send + 'static,
{
    futures.into_iter().collect::<Vec<_>>().join(executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::scheduler::Manual;

    #[test]
    fn empty_vec_is_ready_at_once() {
        let manual = Manual::new();
        let joined = join_all::<_, i32>(&manual.executor(), Vec::new());

        assert!(matches!(joined.get_try(), Ok(Some(v)) if v.is_empty()));
        assert_eq!(manual.pending(), 0);
    }

    #[test]
    fn values_keep_input_order() {
        let manual = Manual::new();
        let executor = manual.executor();
        let (p0, f0) = package(&executor);
        let (p1, f1) = package(&executor);
        let (p2, f2) = package(&executor);

        let joined = join_all(&executor, vec![f0, f1, f2]);

        p2.set_value(30);
        p0.set_value(10);
        assert!(matches!(joined.get_try(), Ok(None)));
        p1.set_value(20);

        assert!(matches!(joined.get_try(), Ok(Some(v)) if v == vec![10, 20, 30]));
    }

    #[test]
    fn lowest_index_failure_wins() {
        let manual = Manual::new();
        let executor = manual.executor();
        let (pa, a) = package::<i32>(&executor);
        let (pb, b) = package::<i32>(&executor);

        let joined = (a, b).join(&executor);

        pb.set_error(Error::msg("second member"));
        assert!(!joined.is_ready());
        pa.set_error(Error::msg("first member"));

        assert_eq!(
            joined.error().map(|e| e.to_string()),
            Some("first member".to_string())
        );
    }

    #[test]
    fn failure_waits_only_for_earlier_members() {
        let manual = Manual::new();
        let executor = manual.executor();
        let (p0, f0) = package::<i32>(&executor);
        let (p1, f1) = package::<i32>(&executor);
        let (_p2, f2) = package::<i32>(&executor);

        let joined = join_all(&executor, vec![f0, f1, f2]);

        p1.set_error(Error::msg("middle"));
        assert!(!joined.is_ready());

        p0.set_value(1);
        assert!(matches!(joined.error(), Some(Error::Message(msg)) if msg == "middle"));
    }

    #[test]
    fn tuple_of_mixed_types() {
        let manual = Manual::new();
        let executor = manual.executor();

        let joined = (
            Future::ready(&executor, 1u8),
            Future::ready(&executor, "two"),
            Future::ready(&executor, 3.0f64),
        )
            .join(&executor);

        assert!(matches!(joined.get_try(), Ok(Some((1, "two", x))) if x == 3.0));
    }
}
