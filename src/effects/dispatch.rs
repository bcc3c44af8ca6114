//! Execution venues for post-commit actions.

use crate::worker::Worker;
use std::fmt;
use std::io;

/// A unit of work handed to a dispatch context.
pub type Job = Box<dyn FnOnce() + Send>;

/// Somewhere a job can be scheduled to run.
///
/// Implementations decide when and on which thread the job runs. The
/// machine only guarantees the order in which it hands jobs over.
pub trait DispatchContext: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// A named thread running jobs one at a time, first in first out.
///
/// Jobs that panic are logged and the queue carries on with the next one.
///
/// # Example
///
/// ```rust
/// use stategate::effects::{DispatchContext, SerialQueue};
/// use std::sync::mpsc;
///
/// let queue = SerialQueue::new("ui").unwrap();
/// let (tx, rx) = mpsc::channel();
///
/// for i in 0..3 {
///     let tx = tx.clone();
///     queue.dispatch(Box::new(move || tx.send(i).unwrap()));
/// }
///
/// queue.flush();
/// assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
/// ```
pub struct SerialQueue {
    worker: Worker<()>,
}

impl SerialQueue {
    pub fn new(label: impl Into<String>) -> io::Result<Self> {
        Ok(Self {
            worker: Worker::spawn(label, ())?,
        })
    }

    pub fn label(&self) -> &str {
        self.worker.label()
    }

    /// Block until every job dispatched so far has finished.
    ///
    /// # Panics
    ///
    /// Panics when called from a job running on this queue.
    pub fn flush(&self) {
        self.worker.call(|_| ());
    }
}

impl DispatchContext for SerialQueue {
    fn dispatch(&self, job: Job) {
        self.worker.post(move |_| job());
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn jobs_run_on_the_named_thread() {
        let queue = SerialQueue::new("named-queue").unwrap();
        let (tx, rx) = mpsc::channel();

        queue.dispatch(Box::new(move || {
            let name = thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("named-queue"));
    }

    #[test]
    fn a_panicking_job_does_not_stop_the_queue() {
        let queue = SerialQueue::new("resilient").unwrap();
        let (tx, rx) = mpsc::channel();

        queue.dispatch(Box::new(|| panic!("job failed")));
        queue.dispatch(Box::new(move || tx.send("after").unwrap()));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "after");
    }

    #[test]
    fn queued_jobs_still_run_after_the_queue_is_dropped() {
        let queue = SerialQueue::new("draining").unwrap();
        let (tx, rx) = mpsc::channel();

        for i in 0..10 {
            let tx = tx.clone();
            queue.dispatch(Box::new(move || tx.send(i).unwrap()));
        }
        drop(queue);
        drop(tx);

        assert_eq!(rx.iter().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
    }
}
