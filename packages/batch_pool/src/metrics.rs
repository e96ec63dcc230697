//! Metrics for batch execution.
//!
//! This module provides events for observing task flow through the pool.
//! The metrics use per-thread event instances to minimize contention.

use nm::{Event, Magnitude};

/// Histogram buckets for task execution time in milliseconds.
///
/// Tasks can be anything from trivial arithmetic to long-running blocking work, so
/// the buckets cover a wide range.
const TASK_EXECUTION_TIME_MS_BUCKETS: &[Magnitude] =
    &[0, 1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

thread_local! {
    /// Event for observing each task handed off to a worker.
    pub(crate) static TASKS_DISPATCHED: Event = Event::builder()
        .name("batch_pool_tasks_dispatched")
        .build();

    /// Event for observing the execution time of tasks, including tasks whose
    /// result was later discarded due to cancellation.
    ///
    /// The magnitude is the execution time in milliseconds.
    pub(crate) static TASK_EXECUTION_TIME_MS: Event = Event::builder()
        .name("batch_pool_task_execution_time_ms")
        .histogram(TASK_EXECUTION_TIME_MS_BUCKETS)
        .build();

    /// Event for observing each result accepted into the output collection.
    pub(crate) static RESULTS_COLLECTED: Event = Event::builder()
        .name("batch_pool_results_collected")
        .build();

    /// Event for observing results a worker discarded because cancellation was
    /// requested before the result could be forwarded.
    pub(crate) static RESULTS_DISCARDED: Event = Event::builder()
        .name("batch_pool_results_discarded_at_cancellation")
        .build();

    /// Event for observing completed batch runs.
    ///
    /// The magnitude is the number of results collected for the batch, so the mean
    /// tracks how much of a typical batch survives cancellation.
    pub(crate) static BATCHES_EXECUTED: Event = Event::builder()
        .name("batch_pool_batch_results")
        .build();
}
