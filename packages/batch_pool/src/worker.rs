//! Worker loop: take one task, run it, forward the result.

use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use nm::Event;
use tracing::trace;

use crate::metrics::{RESULTS_DISCARDED, TASK_EXECUTION_TIME_MS};
use crate::{CancellationToken, TaskPanic, TaskResult};

/// Why a worker left its processing loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum WorkerExit {
    /// The dispatcher delivered every task and dropped the intake.
    SourceExhausted,

    /// Cancellation was observed while waiting for a task or forwarding a result.
    Canceled,
}

/// Repeatedly takes one task, executes the processing function against it, and
/// forwards the result, until the task source is exhausted or cancellation is
/// observed at one of the two blocking points.
pub(crate) fn worker_loop<T, R, F>(
    tasks: &Receiver<T>,
    results: &Sender<TaskResult<R>>,
    token: &CancellationToken,
    process: &F,
) -> WorkerExit
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let done = token.done_receiver();

    loop {
        // Fast path, so that a signal set before the batch started is observed
        // before the first task is accepted.
        if token.is_canceled() {
            return WorkerExit::Canceled;
        }

        let task = select! {
            recv(tasks) -> received => match received {
                Ok(task) => task,
                Err(_) => return WorkerExit::SourceExhausted,
            },
            recv(done) -> _ => return WorkerExit::Canceled,
        };

        // One task's panic must never take the worker down with it; the trap turns
        // the panic into that task's failure descriptor instead.
        let result = TASK_EXECUTION_TIME_MS
            .with(|event| {
                event.observe_duration_millis(|| {
                    panic::catch_unwind(AssertUnwindSafe(|| process(task)))
                })
            })
            .map_err(TaskPanic::new);

        // Forwarding and the cancellation check are one combined choice: a result
        // never slips into the collector "just after" cancellation was requested.
        select! {
            send(results, result) -> forwarded => {
                forwarded.expect("result intake stays open until every worker has exited");
                trace!("result forwarded");
            }
            recv(done) -> _ => {
                RESULTS_DISCARDED.with(Event::observe_once);
                trace!("result discarded, cancellation won the forwarding race");
                return WorkerExit::Canceled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crossbeam::channel::{TryRecvError, bounded, unbounded};

    use super::*;
    use crate::test_utils::with_watchdog;

    #[test]
    fn processes_until_source_exhausted() {
        let (task_tx, task_rx) = unbounded::<u32>();
        let (result_tx, result_rx) = unbounded::<TaskResult<u32>>();
        let token = CancellationToken::new();

        for task in [1, 2, 3] {
            task_tx.send(task).unwrap();
        }
        drop(task_tx);

        let exit = worker_loop(&task_rx, &result_tx, &token, &|x| x * 10);

        assert_eq!(exit, WorkerExit::SourceExhausted);

        drop(result_tx);
        let results: Vec<_> = result_rx.into_iter().map(Result::unwrap).collect();
        assert_eq!(results, vec![10, 20, 30]);
    }

    #[test]
    fn panic_becomes_failure_descriptor() {
        let (task_tx, task_rx) = unbounded::<u32>();
        let (result_tx, result_rx) = unbounded::<TaskResult<u32>>();
        let token = CancellationToken::new();

        task_tx.send(0).unwrap();
        task_tx.send(7).unwrap();
        drop(task_tx);

        let exit = worker_loop(&task_rx, &result_tx, &token, &|x| {
            assert!(x != 0, "zero task");
            x
        });

        // The panic was local to its task; the worker kept going.
        assert_eq!(exit, WorkerExit::SourceExhausted);

        drop(result_tx);
        let results: Vec<_> = result_rx.into_iter().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results.iter().filter_map(|r| r.as_ref().err()).count(),
            1
        );
    }

    #[test]
    fn canceled_signal_stops_worker_before_accepting_a_task() {
        let (task_tx, task_rx) = unbounded::<u32>();
        let (result_tx, result_rx) = unbounded::<TaskResult<u32>>();
        let token = CancellationToken::new();

        task_tx.send(1).unwrap();
        token.cancel();

        let exit = worker_loop(&task_rx, &result_tx, &token, &|x| x);

        assert_eq!(exit, WorkerExit::Canceled);

        drop(result_tx);
        assert_eq!(result_rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn cancellation_at_forward_time_discards_the_result() {
        with_watchdog(|| {
            let (task_tx, task_rx) = unbounded::<u32>();
            // Rendezvous intake with no collector: forwarding can only ever
            // complete by losing to cancellation.
            let (result_tx, result_rx) = bounded::<TaskResult<u32>>(0);
            let token = CancellationToken::new();

            task_tx.send(1).unwrap();

            let canceler = thread::spawn({
                let token = token.clone();
                move || {
                    thread::sleep(Duration::from_millis(50));
                    token.cancel();
                }
            });

            let exit = worker_loop(&task_rx, &result_tx, &token, &|x| x);

            assert_eq!(exit, WorkerExit::Canceled);
            assert_eq!(result_rx.try_recv(), Err(TryRecvError::Empty));

            canceler.join().unwrap();
        });
    }
}
