//! Future core.
//!
//! A [`Future`] is a shared handle to a reference-counted core holding a
//! result slot and the continuations waiting on it. The slot is written
//! once, by the [`Promise`] held by the producing task; continuations then
//! fire in registration order.
//!
//! Waiting is never done by the core itself: callers poll with
//! [`Future::get_try`], attach continuations, `.await` the future, or opt
//! into a blocking [`Future::wait`].

mod core;
mod handle;
mod promise;
mod spawn;

pub(crate) use self::core::Outcome;
pub(crate) use spawn::{catch, catch_fallible};

pub use handle::{Future, Settled};
pub use promise::{Promise, package};
pub use spawn::{spawn, try_spawn};
