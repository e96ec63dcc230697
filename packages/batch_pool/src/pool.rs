//! Pool configuration and batch orchestration.

use std::num::NonZero;
use std::thread;

use crossbeam::channel::bounded;
use nm::Event;
use tracing::{debug, error};

use crate::metrics::{BATCHES_EXECUTED, RESULTS_COLLECTED};
use crate::{CancellationToken, TaskResult, dispatch_all, worker_loop};

/// A fixed-size worker pool that executes one batch of tasks at a time.
///
/// The pool holds only configuration; every call to [`execute()`][Self::execute]
/// starts a fresh set of worker threads for that batch and joins them all before
/// returning, so there is no separate shutdown step and nothing can leak.
///
/// # Worker count
///
/// The worker count is fixed for the lifetime of a batch and is a [`NonZero`],
/// which makes a zero-sized pool unrepresentable rather than a runtime error.
/// The default is [`std::thread::available_parallelism()`].
///
/// # Cancellation
///
/// A pool built with [`cancellation()`][BatchPoolBuilder::cancellation] observes
/// the given token at every blocking point: before each task handoff, before each
/// task acceptance, and before each result delivery. See [`CancellationToken`].
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use batch_pool::BatchPool;
///
/// let pool = BatchPool::builder()
///     .worker_count(NonZero::new(4).unwrap())
///     .build();
///
/// let results = pool.execute((0..10).collect(), |x: u32| x + 1);
/// assert_eq!(results.len(), 10);
/// ```
#[derive(Clone, Debug)]
pub struct BatchPool {
    worker_count: NonZero<usize>,
    cancellation: CancellationToken,
}

impl BatchPool {
    /// Creates a pool with the given worker count and default settings otherwise.
    ///
    /// Use [`BatchPool::builder()`] for custom configuration.
    #[must_use]
    pub fn new(worker_count: NonZero<usize>) -> Self {
        Self::builder().worker_count(worker_count).build()
    }

    /// Creates a builder for configuring the pool.
    #[must_use]
    pub fn builder() -> BatchPoolBuilder {
        BatchPoolBuilder::new()
    }

    /// Returns the number of workers the pool starts for each batch.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }

    /// Returns the cancellation token linked to this pool.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Executes every task in the batch and returns the collected results.
    ///
    /// Tasks are handed to workers in batch order; results are collected in the
    /// order they complete, which for more than one worker is not the batch order.
    /// Callers that need to correlate results with tasks capture the task identity
    /// in the processing function's return value.
    ///
    /// Returns only after every thread started for the batch has exited.
    ///
    /// # Cancellation
    ///
    /// If the pool's [`CancellationToken`] is canceled, no further task is handed
    /// out and no further result is accepted; the output then contains fewer
    /// entries than the batch. A worker mid-task finishes its current unit of work
    /// first, and its result is discarded if cancellation won the forwarding race.
    /// The processing function is never terminated forcibly - functions that run
    /// long should observe the token themselves.
    ///
    /// # Task panics
    ///
    /// A processing function that panics yields an `Err(`[`TaskPanic`]`)` entry in
    /// the output; the worker itself carries on with the next task.
    ///
    /// [`TaskPanic`]: crate::TaskPanic
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::NonZero;
    ///
    /// use batch_pool::BatchPool;
    ///
    /// let pool = BatchPool::new(NonZero::new(2).unwrap());
    ///
    /// // Domain failures travel inside the processing function's return type.
    /// let results = pool.execute(vec![2, 0, 4], |divisor: u32| {
    ///     100_u32.checked_div(divisor).ok_or("division by zero")
    /// });
    ///
    /// let outcomes: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    /// assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
    /// ```
    #[cfg_attr(test, mutants::skip)] // If pool threads do not get spawned, deadlocks are very easy.
    #[must_use]
    pub fn execute<T, R, F>(&self, tasks: Vec<T>, process: F) -> Vec<TaskResult<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let batch_len = tasks.len();
        let worker_count = self.worker_count.get();
        let token = &self.cancellation;

        // Rendezvous channels: a task changes hands only once a worker is actually
        // ready to take it, and a result only once the collector is ready to
        // receive it.
        let (task_tx, task_rx) = bounded::<T>(0);
        let (result_tx, result_rx) = bounded::<TaskResult<R>>(0);

        debug!(worker_count, batch_len, "starting batch");

        let results = thread::scope(|scope| {
            let process = &process;

            let worker_handles: Vec<_> = (0..worker_count)
                .map(|worker_index| {
                    let task_rx = task_rx.clone();
                    let result_tx = result_tx.clone();

                    thread::Builder::new()
                        .name(format!("batch-pool-w{worker_index}"))
                        .spawn_scoped(scope, move || {
                            debug!(worker_index, "worker thread started");
                            let exit = worker_loop(&task_rx, &result_tx, token, process);
                            debug!(worker_index, ?exit, "worker thread exiting");
                        })
                        .expect(
                            "failed to spawn worker thread: thread spawning failure is not supported",
                        )
                })
                .collect();

            // Workers hold their own clones; the originals must not keep the
            // channels alive past their owners.
            drop(task_rx);

            let dispatcher_handle = thread::Builder::new()
                .name("batch-pool-dispatch".to_string())
                .spawn_scoped(scope, move || {
                    dispatch_all(tasks, task_tx, token);
                })
                .expect(
                    "failed to spawn dispatcher thread: thread spawning failure is not supported",
                );

            // The finalizer owns the last result sender and closes the intake only
            // after every worker has been joined. A worker must never be the one
            // to close it: its siblings may still be forwarding.
            thread::Builder::new()
                .name("batch-pool-finalize".to_string())
                .spawn_scoped(scope, move || {
                    for handle in worker_handles {
                        if handle.join().is_err() {
                            // Workers trap task panics, so an unwinding worker
                            // means the pool infrastructure itself is broken.
                            error!("worker thread panicked outside the task panic trap");
                        }
                    }

                    if dispatcher_handle.join().is_err() {
                        error!("dispatcher thread panicked");
                    }

                    drop(result_tx);
                })
                .expect(
                    "failed to spawn finalizer thread: thread spawning failure is not supported",
                );

            // Accumulate in completion order until the intake is finalized and
            // fully drained. Termination is tied to worker exit, never to a task
            // count: canceled batches deliver fewer results than tasks.
            let mut results = Vec::with_capacity(batch_len);
            for result in &result_rx {
                RESULTS_COLLECTED.with(Event::observe_once);
                results.push(result);
            }

            results
        });

        BATCHES_EXECUTED.with(|event| event.observe(results.len()));
        debug!(collected = results.len(), batch_len, "batch finished");

        results
    }
}

impl Default for BatchPool {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for configuring a [`BatchPool`].
#[derive(Debug)]
pub struct BatchPoolBuilder {
    worker_count: Option<NonZero<usize>>,
    cancellation: Option<CancellationToken>,
}

impl BatchPoolBuilder {
    fn new() -> Self {
        Self {
            worker_count: None,
            cancellation: None,
        }
    }

    /// Sets the number of worker threads started for each batch.
    ///
    /// Default is [`std::thread::available_parallelism()`].
    #[must_use]
    pub fn worker_count(mut self, count: NonZero<usize>) -> Self {
        self.worker_count = Some(count);
        self
    }

    /// Links the pool to an externally controlled cancellation token, typically
    /// shared with a deadline timer or an abort request handler.
    ///
    /// Default is a fresh token that nothing ever cancels.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the pool with the configured settings.
    #[must_use]
    pub fn build(self) -> BatchPool {
        BatchPool {
            worker_count: self.worker_count.unwrap_or_else(default_worker_count),
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

fn default_worker_count() -> NonZero<usize> {
    // Niche environments may not report their parallelism; one worker is the
    // conservative floor.
    thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN)
}
