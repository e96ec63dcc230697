//! Testing utilities for the `batch_pool` crate.
//!
//! Most pool tests exercise blocking channel operations, where a logic error shows
//! up as a hang rather than a failed assertion. The watchdog converts such hangs
//! into prompt test failures.

use std::panic;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Generous compared to any expected test duration; a test that reaches this has
/// deadlocked, not slowed down.
const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs a test on a separate thread and panics if it does not complete within
/// [`WATCHDOG_TIMEOUT`].
pub(crate) fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        // If this send fails, the receiver has already timed out.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(WATCHDOG_TIMEOUT) {
        Ok(result) => {
            test_handle.join().expect("test thread already sent its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded the watchdog timeout - likely deadlocked in a channel operation");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // The test thread panicked before sending; surface its panic.
            match test_handle.join() {
                Ok(()) => panic!("test thread disconnected without panicking"),
                Err(e) => panic::resume_unwind(e),
            }
        }
    }
}
