//! Errors raised while building a state machine.

use std::io;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Failed to spawn state machine thread: {0}")]
    Spawn(#[from] io::Error),
}
