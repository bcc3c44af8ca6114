//! Context handed to conditions and actions.

use super::state::State;
use std::sync::Arc;

/// The transition being checked or the one that was just committed.
///
/// Conditions see it before the change happens, actions see it afterwards.
/// The user info payload travels untouched from the call site.
#[derive(Debug)]
pub struct TransitionContext<S: State, U = ()> {
    pub from: S,
    pub to: S,
    user_info: Option<Arc<U>>,
}

impl<S: State, U> TransitionContext<S, U> {
    pub fn new(from: S, to: S, user_info: Option<Arc<U>>) -> Self {
        Self {
            from,
            to,
            user_info,
        }
    }

    /// Payload passed to `change_to_with` and friends, if any.
    pub fn user_info(&self) -> Option<&U> {
        self.user_info.as_deref()
    }
}

// Manual impl: cloning shares the payload, so `U` needs no `Clone`.
impl<S: State, U> Clone for TransitionContext<S, U> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            user_info: self.user_info.clone(),
        }
    }
}
