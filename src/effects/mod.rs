//! Side effects that follow a committed transition.
//!
//! This module is the imperative shell around the core: it decides where
//! post-commit callbacks run and in which order they are handed off.
//!
//! # Key Concepts
//!
//! - **Dispatch contexts**: where a callback runs (`SerialQueue`, or
//!   `TokioContext` with the `tokio` feature)
//! - **Actions**: callbacks registered for entering a state, leaving a
//!   state, or any change
//! - **Ordering**: entering, then leaving, then any; a hand-off order, not a
//!   completion order

mod action;
mod dispatch;
#[cfg(feature = "tokio")]
mod tokio_context;

pub use action::{Action, ActionFn, ActionRegistry};
pub use dispatch::{DispatchContext, Job, SerialQueue};
#[cfg(feature = "tokio")]
pub use tokio_context::TokioContext;
