//! Rate-limited delivery of host notifications to IYUU recipients.
//!
//! Events enter through [`Dispatcher::enqueue`], wait in an unbounded
//! [`queue`], and are delivered by a single background [`worker`] that paces
//! provider calls with a [`limiter::RateLimiter`] and fans each message out to
//! every configured token.

pub mod client;
pub mod dispatcher;
pub mod fanout;
pub mod limiter;
pub mod queue;
pub mod worker;

pub use client::{DispatchOutcome, IyuuClient, NotificationClient};
pub use dispatcher::{Admission, Dispatcher};
pub use worker::WorkerState;

#[cfg(test)]
pub(crate) mod testing;
