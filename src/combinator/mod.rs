//! Combinators building new futures from existing ones.
//!
//! - [`Future::then`](crate::Future::then) and
//!   [`Future::try_then`](crate::Future::try_then) chain work on success,
//! - [`Future::recover`](crate::Future::recover) chains work on any
//!   outcome,
//! - [`when_all`] and [`join_all`] wait for groups of futures.

mod continuation;
mod when_all;

pub use when_all::{Join, join_all, when_all};
