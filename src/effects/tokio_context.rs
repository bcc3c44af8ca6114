//! Tokio-backed dispatch context.

use super::dispatch::{DispatchContext, Job};
use tokio::runtime::Handle;

/// Runs each job on a Tokio runtime's blocking pool.
///
/// Jobs may call back into a state machine, which blocks, so they never
/// run on the async worker threads.
#[derive(Clone, Debug)]
pub struct TokioContext {
    handle: Handle,
}

impl TokioContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Context for the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl DispatchContext for TokioContext {
    fn dispatch(&self, job: Job) {
        // Panics inside the job end up in the dropped JoinHandle.
        drop(self.handle.spawn_blocking(job));
    }
}
