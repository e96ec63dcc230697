//! Fixed-size worker pool that executes one batch of tasks with cooperative cancellation.
//!
//! This crate provides [`BatchPool`], a pool of worker threads that consumes a
//! caller-supplied batch of tasks, executes each task exactly once, and collects the
//! results in whatever order they complete. A [`CancellationToken`] linked to the pool
//! stops task distribution and result delivery at the next blocking point of every
//! pool thread, without leaking threads or deadlocking the caller.
//!
//! # Quick start
//!
//! ```rust
//! use std::num::NonZero;
//!
//! use batch_pool::BatchPool;
//!
//! let pool = BatchPool::new(NonZero::new(4).unwrap());
//!
//! let results = pool.execute((1..=10).collect(), |x: u64| x * x);
//!
//! // Results arrive in completion order, not submission order.
//! assert_eq!(results.len(), 10);
//!
//! let total: u64 = results.into_iter().map(Result::unwrap).sum();
//! assert_eq!(total, 385);
//! ```
//!
//! # Key properties
//!
//! - **Bounded concurrency**: exactly the configured number of workers run at any
//!   moment; the count never changes during a batch.
//! - **Exactly-once handoff**: every task is delivered to at most one worker, in
//!   batch order, over a rendezvous channel.
//! - **Cooperative cancellation**: [`CancellationToken::cancel`] stops distribution
//!   and result delivery; a task already running is allowed to finish its unit of
//!   work, and its result is discarded if it arrives after cancellation.
//! - **Failures are data**: a task that panics produces an `Err(`[`TaskPanic`]`)`
//!   entry in the output rather than taking down the worker or the batch.
//!
//! # Cancellation
//!
//! ```rust
//! use batch_pool::{BatchPool, CancellationToken};
//!
//! let token = CancellationToken::new();
//! token.cancel();
//!
//! let pool = BatchPool::builder().cancellation(token).build();
//!
//! // The signal was set before any task could be dispatched, so nothing runs.
//! let results = pool.execute(vec![1, 2, 3], |x: i32| x);
//! assert!(results.is_empty());
//! ```
//!
//! Cancellation is not an error: the caller simply receives fewer results than
//! tasks. Whether a short batch constitutes a failure is the caller's decision.
//!
//! # Termination
//!
//! [`BatchPool::execute`] returns only after every thread it started has exited.
//! There is nothing to shut down or join afterwards; dropping the pool is free.

mod cancellation;
mod dispatcher;
mod metrics;
mod outcome;
mod pool;
#[cfg(test)]
mod test_utils;
mod worker;

pub use cancellation::*;
pub(crate) use dispatcher::*;
pub use outcome::*;
pub use pool::*;
pub(crate) use worker::*;
