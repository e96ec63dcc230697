//! Results produced for accepted tasks.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic;

/// The outcome produced for one accepted task.
///
/// The success value is whatever the processing function returned. Callers that need
/// a value-or-failure-descriptor shape for their domain use a `Result` as the return
/// type of the processing function itself; the pool treats that as an ordinary value.
/// The `Err` variant is reserved for the one failure class the pool itself detects:
/// the processing function panicked.
pub type TaskResult<R> = Result<R, TaskPanic>;

/// The failure descriptor recorded when a processing function panics.
///
/// A panicking task never aborts its worker or the batch; the panic is trapped and
/// delivered to the caller as this value, alongside the results of the tasks that
/// succeeded.
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
/// let results = pool.execute(vec![1, 2], |x: i32| {
///     assert!(x % 2 != 0, "even input");
///     x
/// });
///
/// assert_eq!(results.len(), 2);
/// assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
///
/// let panic = results.into_iter().find_map(Result::err).unwrap();
/// assert_eq!(panic.message(), Some("even input"));
/// ```
pub struct TaskPanic {
    payload: Box<dyn Any + Send + 'static>,
}

impl TaskPanic {
    pub(crate) fn new(payload: Box<dyn Any + Send + 'static>) -> Self {
        Self { payload }
    }

    /// Returns the panic message if the payload was a string, which is the case for
    /// the vast majority of panics (`panic!`, `assert!` and friends).
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if let Some(message) = self.payload.downcast_ref::<&'static str>() {
            Some(message)
        } else {
            self.payload.downcast_ref::<String>().map(String::as_str)
        }
    }

    /// Consumes the descriptor and returns the raw panic payload.
    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send + 'static> {
        self.payload
    }

    /// Resumes unwinding with the captured payload, for callers that prefer to
    /// propagate the panic instead of treating it as data.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.payload)
    }
}

impl fmt::Debug for TaskPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPanic")
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for TaskPanic {
    #[cfg_attr(test, mutants::skip)] // No API contract for error message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "task panicked: {message}"),
            None => write!(f, "task panicked with a non-string payload"),
        }
    }
}

impl Error for TaskPanic {}
