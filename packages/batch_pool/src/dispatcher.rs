//! Source-order task handoff to the worker set.

use crossbeam::channel::Sender;
use crossbeam::select;
use nm::Event;
use tracing::{debug, trace};

use crate::CancellationToken;
use crate::metrics::TASKS_DISPATCHED;

/// Delivers each task, in source order, to whichever worker next becomes ready to
/// receive, stopping as soon as cancellation is requested.
///
/// Dropping `intake` on return is the "no more tasks" notice: workers waiting to
/// receive observe the disconnect and exit their loop instead of blocking forever.
///
/// Returns the number of tasks that were handed off.
pub(crate) fn dispatch_all<T>(tasks: Vec<T>, intake: Sender<T>, token: &CancellationToken) -> usize
where
    T: Send,
{
    let done = token.done_receiver();
    let mut dispatched = 0_usize;

    for task in tasks {
        // Fast path, so that a signal set before the batch started stops the
        // dispatcher before the first handoff. The select below covers the rest:
        // the handoff and the cancellation check are one combined choice, not two
        // sequential steps with a window between them.
        if token.is_canceled() {
            break;
        }

        select! {
            send(intake, task) -> delivered => {
                if delivered.is_err() {
                    // Every worker has already exited; nobody is left to take
                    // the remaining tasks.
                    break;
                }

                dispatched = dispatched.saturating_add(1);
                TASKS_DISPATCHED.with(Event::observe_once);
                trace!(dispatched, "task handed to worker");
            }
            recv(done) -> _ => break,
        }
    }

    debug!(dispatched, "dispatcher exiting");

    dispatched
}
