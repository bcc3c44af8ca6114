//! Errors returned when a transition is refused.

use std::fmt::Debug;
use thiserror::Error;

/// Reasons the engine itself refuses a transition.
///
/// States are rendered with their `Debug` output, so `String` states show
/// up quoted: `No rule allows changing from "Pending" to "Passed"`.
///
/// A machine may use its own error type instead, as long as it converts
/// from this one. Errors returned by conditions then reach the caller
/// untouched:
///
/// ```rust
/// use stategate::TransitionError;
/// use thiserror::Error;
///
/// #[derive(Debug, Error)]
/// enum DoorError {
///     #[error(transparent)]
///     Machine(#[from] TransitionError),
///     #[error("the door is jammed")]
///     Jammed,
/// }
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Already in the requested state {state}")]
    AlreadyInRequestedState { state: String },

    #[error("No rule allows changing from {from} to {to}")]
    UnsupportedTransition { from: String, to: String },

    #[error("No transition named '{0}'")]
    UnknownTransitionName(String),

    /// Condition failure for machines using the default error type.
    #[error("Transition rejected: {0}")]
    Rejected(String),
}

impl TransitionError {
    pub(crate) fn already_in<S: Debug>(state: &S) -> Self {
        Self::AlreadyInRequestedState {
            state: format!("{state:?}"),
        }
    }

    pub(crate) fn unsupported<S: Debug>(from: &S, to: &S) -> Self {
        Self::UnsupportedTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}
