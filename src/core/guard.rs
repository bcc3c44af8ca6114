//! Condition gates consulted before a transition commits.
//!
//! Conditions are fallible predicates. They are kept per state in two
//! ordered lists: one for leaving a state and one for entering it.

use super::context::TransitionContext;
use super::state::State;
use std::collections::HashMap;
use std::sync::Arc;

/// Fallible predicate over a pending transition.
///
/// # Example
///
/// ```rust
/// use stategate::core::{Condition, TransitionContext};
///
/// let only_upwards: Condition<u8, (), String> = Condition::new(|ctx: &TransitionContext<u8>| {
///     if ctx.to > ctx.from {
///         Ok(())
///     } else {
///         Err(format!("{} is not above {}", ctx.to, ctx.from))
///     }
/// });
///
/// assert!(only_upwards.check(&TransitionContext::new(1, 2, None)).is_ok());
/// assert!(only_upwards.check(&TransitionContext::new(2, 1, None)).is_err());
/// ```
pub struct Condition<S: State, U, E> {
    predicate: Arc<dyn Fn(&TransitionContext<S, U>) -> Result<(), E> + Send + Sync>,
}

impl<S: State, U, E> Condition<S, U, E> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&TransitionContext<S, U>) -> Result<(), E> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, ctx: &TransitionContext<S, U>) -> Result<(), E> {
        (self.predicate)(ctx)
    }
}

impl<S: State, U, E> Clone for Condition<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

/// Ordered condition lists keyed by the state they gate.
pub struct ConditionRegistry<S: State, U, E> {
    before_leaving: HashMap<S, Vec<Condition<S, U, E>>>,
    before_entering: HashMap<S, Vec<Condition<S, U, E>>>,
}

impl<S: State, U, E> Default for ConditionRegistry<S, U, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, U, E> ConditionRegistry<S, U, E> {
    pub fn new() -> Self {
        Self {
            before_leaving: HashMap::new(),
            before_entering: HashMap::new(),
        }
    }

    /// Append `condition` to the leaving list of every state in `states`.
    pub fn add_before_leaving(
        &mut self,
        states: impl IntoIterator<Item = S>,
        condition: Condition<S, U, E>,
    ) {
        append(&mut self.before_leaving, states, condition);
    }

    /// Append `condition` to the entering list of every state in `states`.
    pub fn add_before_entering(
        &mut self,
        states: impl IntoIterator<Item = S>,
        condition: Condition<S, U, E>,
    ) {
        append(&mut self.before_entering, states, condition);
    }

    /// Run the leaving conditions of `ctx.from`, then the entering conditions
    /// of `ctx.to`, each in registration order. Stops at the first failure
    /// and returns its error untouched.
    pub fn check_all(&self, ctx: &TransitionContext<S, U>) -> Result<(), E> {
        let leaving = self.before_leaving.get(&ctx.from).into_iter().flatten();
        let entering = self.before_entering.get(&ctx.to).into_iter().flatten();

        leaving
            .chain(entering)
            .try_for_each(|condition| condition.check(ctx))
    }
}

fn append<S: State, U, E>(
    map: &mut HashMap<S, Vec<Condition<S, U, E>>>,
    states: impl IntoIterator<Item = S>,
    condition: Condition<S, U, E>,
) {
    for state in states {
        map.entry(state).or_default().push(condition.clone());
    }
}
