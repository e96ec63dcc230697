//! One-way cancellation signaling shared by every component of a batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

/// A one-way signal requesting early, cooperative termination of a batch.
///
/// The token starts in the active state and can transition to canceled exactly once;
/// it never resets. Setting the signal is non-blocking and idempotent, and observing
/// it is a non-blocking atomic read, so any number of components can share one token.
///
/// Clones are cheap and all refer to the same underlying state.
///
/// # Example
///
/// ```rust
/// use batch_pool::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_canceled());
///
/// let observer = token.clone();
/// token.cancel();
/// assert!(observer.is_canceled());
///
/// // Setting the signal again has no further effect.
/// token.cancel();
/// assert!(observer.is_canceled());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    canceled: AtomicBool,

    // Dropped on cancel, which disconnects every receiver handed out by
    // `done_receiver()` and wakes anything blocked in a select over one.
    done_tx: Mutex<Option<Sender<()>>>,

    // Receivers are cloned from this one; it is never received from directly.
    done_rx: Mutex<Receiver<()>>,
}

impl CancellationToken {
    /// Creates a new token in the active (not canceled) state.
    #[must_use]
    pub fn new() -> Self {
        let (done_tx, done_rx) = bounded(0);

        Self {
            inner: Arc::new(TokenInner {
                canceled: AtomicBool::new(false),
                done_tx: Mutex::new(Some(done_tx)),
                done_rx: Mutex::new(done_rx),
            }),
        }
    }

    /// Requests cancellation.
    ///
    /// Never blocks and never fails; calling it on an already-canceled token is a
    /// no-op. Components observe the signal at their next blocking point - work
    /// already in progress is not preempted.
    pub fn cancel(&self) {
        // Release pairs with the Acquire in `is_canceled()` so an observer that
        // sees the flag also sees every write that preceded the cancel.
        self.inner.canceled.store(true, Ordering::Release);

        // Disconnect the done channel. Taking the sender out of its slot makes
        // repeat calls no-ops.
        drop(self.inner.done_tx.lock().take());
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    /// Returns a receiver that becomes ready (disconnected) once the token is
    /// canceled, for folding the cancellation check into a `select!` together
    /// with the operation it guards.
    pub(crate) fn done_receiver(&self) -> Receiver<()> {
        self.inner.done_rx.lock().clone()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
