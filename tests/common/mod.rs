//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::mpsc::Receiver;
use std::time::Duration;
use stategate::state_enum;

/// How long a test waits for an action before giving up.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize tracing for tests. Set `RUST_LOG=stategate=trace` to see output.
pub fn setup_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

state_enum! {
    pub enum Build {
        Pending,
        Testing,
        Passed,
        Failed,
    }
}

/// Receive `count` messages, failing the test if any takes too long.
pub fn receive<T>(rx: &Receiver<T>, count: usize) -> Vec<T> {
    (0..count)
        .map(|_| rx.recv_timeout(TIMEOUT).expect("timed out waiting for an action"))
        .collect()
}
