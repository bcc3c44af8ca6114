//! Single-threaded owner of a value.
//!
//! A `Worker<T>` moves `T` onto a dedicated thread and applies tasks to it
//! strictly one at a time, in the order they were submitted. Posting is
//! fire-and-forget; calling blocks until the task has run.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, ThreadId};

/// Work applied to the owned value.
pub(crate) type Task<T> = Box<dyn FnOnce(&mut T) + Send>;

pub(crate) struct Worker<T> {
    sender: Sender<Task<T>>,
    thread: ThreadId,
    label: String,
}

impl<T: Send + 'static> Worker<T> {
    /// Start a thread named `label` that owns `value`.
    ///
    /// The thread exits once every handle is dropped and the queue is drained.
    pub(crate) fn spawn(label: impl Into<String>, mut value: T) -> io::Result<Self> {
        let label = label.into();
        let (sender, receiver) = mpsc::channel::<Task<T>>();

        let name = label.clone();
        let handle = thread::Builder::new().name(label.clone()).spawn(move || {
            tracing::trace!(worker = %name, "worker started");
            while let Ok(task) = receiver.recv() {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task(&mut value))) {
                    tracing::error!(
                        worker = %name,
                        panic = panic_message(payload.as_ref()),
                        "task panicked"
                    );
                }
            }
            tracing::trace!(worker = %name, "worker stopped");
        })?;

        Ok(Self {
            sender,
            thread: handle.thread().id(),
            label,
        })
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Queue `task` without waiting for it.
    pub(crate) fn post(&self, task: impl FnOnce(&mut T) + Send + 'static) {
        if self.sender.send(Box::new(task)).is_err() {
            tracing::error!(worker = %self.label, "worker thread is gone, task dropped");
        }
    }

    /// Queue `task` and block until it has produced its result.
    ///
    /// A panic inside `task` is re-raised on the calling thread.
    pub(crate) fn call<R>(&self, task: impl FnOnce(&mut T) -> R + Send + 'static) -> R
    where
        R: Send + 'static,
    {
        self.call_then(move |value| (task(value), None))
    }

    /// Like [`call`](Self::call), but `task` may hand back a follow-up.
    ///
    /// The follow-up runs on the worker after the caller has been released
    /// and before any other queued task, so nothing can observe the value
    /// between `task` and its follow-up.
    ///
    /// # Panics
    ///
    /// Panics when invoked from the worker's own thread, which would
    /// otherwise deadlock waiting on itself.
    pub(crate) fn call_then<R, F>(&self, task: F) -> R
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> (R, Option<Task<T>>) + Send + 'static,
    {
        assert!(
            thread::current().id() != self.thread,
            "synchronous call into `{}` from its own worker thread would deadlock",
            self.label
        );

        let (reply, answer) = mpsc::sync_channel::<Result<R, Box<dyn Any + Send>>>(1);
        self.post(move |value| {
            match panic::catch_unwind(AssertUnwindSafe(|| task(value))) {
                Ok((result, follow_up)) => {
                    let _ = reply.send(Ok(result));
                    if let Some(follow_up) = follow_up {
                        follow_up(value);
                    }
                }
                Err(payload) => {
                    let _ = reply.send(Err(payload));
                }
            }
        });

        match answer.recv() {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => panic!("worker `{}` stopped before answering", self.label),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn tasks_run_in_submission_order() {
        let worker = Worker::spawn("order", Vec::new()).unwrap();
        for i in 0..100 {
            worker.post(move |log: &mut Vec<i32>| log.push(i));
        }

        let log = worker.call(|log| log.clone());
        assert_eq!(log, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn follow_up_runs_before_later_tasks() {
        let worker = Worker::spawn("follow-up", Vec::new()).unwrap();

        let answer = worker.call_then(|log: &mut Vec<u32>| {
            log.push(1);
            let follow_up: Task<Vec<u32>> = Box::new(|log: &mut Vec<u32>| log.push(2));
            (7, Some(follow_up))
        });
        worker.post(|log| log.push(3));

        assert_eq!(answer, 7);
        assert_eq!(worker.call(|log| log.clone()), vec![1, 2, 3]);
    }

    #[test]
    fn panics_resurface_on_the_caller() {
        let worker = Worker::spawn("panics", 0u32).unwrap();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            worker.call(|_: &mut u32| -> u32 { panic!("boom") })
        }));

        assert!(outcome.is_err());
        // The worker survives and keeps its value.
        worker.post(|n| *n += 1);
        assert_eq!(worker.call(|n| *n), 1);
    }

    #[test]
    fn reentrant_calls_panic_instead_of_deadlocking() {
        let worker = Arc::new(Worker::spawn("reentrant", ()).unwrap());
        let (tx, rx) = mpsc::channel();

        let inner = Arc::clone(&worker);
        worker.post(move |_| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| inner.call(|_| ())));
            let _ = tx.send(outcome.is_err());
        });

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
    }
}
