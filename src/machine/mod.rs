//! The thread-safe state machine handle.
//!
//! Every machine owns a worker thread that holds its current state and all
//! of its tables. Handles talk to that thread through one FIFO queue:
//!
//! - configuration (`add_*`) is posted and returns immediately
//! - reads and checks (`current_state`, `can_*`) block until answered
//! - `change_to` and `perform_named` block for the check only; the commit
//!   runs right after on the worker, before anything else queued
//!
//! Because everything shares one queue, a thread always observes its own
//! earlier calls. Configuration may be changed at any time; there is no
//! freeze step. Calls from different threads are ordered by arrival.

mod engine;
mod error;

pub use error::TransitionError;

use crate::builder::{BuildError, StateMachineBuilder};
use crate::core::{Condition, NamedTransition, Rule, State, TransitionContext};
use crate::effects::{Action, DispatchContext};
use crate::worker::{Task, Worker};
use engine::{ActionSlot, Engine};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

struct Shared<S: State, U, E> {
    id: Uuid,
    name: String,
    worker: Worker<Engine<S, U, E>>,
}

/// A finite state machine that can be shared between threads.
///
/// Cloning a `StateMachine` yields another handle to the same machine.
/// Callbacks that need to reach the machine should hold a
/// [`WeakStateMachine`] so the machine is not kept alive by its own
/// callbacks.
///
/// # Example
///
/// ```rust
/// use stategate::{StateMachine, TransitionError};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Build {
///     Pending,
///     Testing,
///     Passed,
///     Failed,
/// }
///
/// let machine: StateMachine<Build> = StateMachine::new(Build::Pending).unwrap();
/// machine.add_rule([Build::Pending], [Build::Testing]);
/// machine.add_rule([Build::Testing], [Build::Passed, Build::Failed]);
///
/// machine.change_to(Build::Testing).unwrap();
/// assert_eq!(machine.current_state(), Build::Testing);
///
/// assert!(matches!(
///     machine.change_to(Build::Pending),
///     Err(TransitionError::UnsupportedTransition { .. })
/// ));
/// ```
pub struct StateMachine<S: State, U = (), E = TransitionError> {
    shared: Arc<Shared<S, U, E>>,
}

impl<S, U, E> StateMachine<S, U, E>
where
    S: State,
    U: Send + Sync + 'static,
    E: From<TransitionError> + Send + 'static,
{
    /// Machine starting in `initial` with default settings.
    pub fn new(initial: S) -> Result<Self, BuildError> {
        Self::builder().initial(initial).build()
    }

    pub fn builder() -> StateMachineBuilder<S, U, E> {
        StateMachineBuilder::new()
    }

    pub(crate) fn start(
        name: String,
        initial: S,
        default_context: Arc<dyn DispatchContext>,
    ) -> Result<Self, BuildError> {
        let id = Uuid::new_v4();
        let engine = Engine::new(name.clone(), id, initial, default_context);
        let worker = Worker::spawn(name.clone(), engine)?;
        tracing::debug!(machine = %name, %id, "state machine started");

        Ok(Self {
            shared: Arc::new(Shared { id, name, worker }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    fn worker(&self) -> &Worker<Engine<S, U, E>> {
        &self.shared.worker
    }

    /// The state as of every operation queued before this call.
    pub fn current_state(&self) -> S {
        self.worker().call(|engine| engine.current().clone())
    }

    /// Wait until every operation queued before this call, commits
    /// included, has been applied.
    pub fn flush(&self) {
        self.worker().call(|_| ());
    }

    // ---- rules ----

    /// Allow changing from any of `from` to any of `to`.
    ///
    /// Ignored if either list is empty or the same rule already exists.
    pub fn add_rule(&self, from: impl IntoIterator<Item = S>, to: impl IntoIterator<Item = S>) {
        let rule = Rule::new(from, to);
        self.worker().post(move |engine| engine.add_rule(rule));
    }

    /// Allow changing to `destination` from any of `from`.
    pub fn allow_changing_to(&self, destination: S, from: impl IntoIterator<Item = S>) {
        self.add_rule(from, [destination]);
    }

    /// Allow changing from `source` to any of `to`.
    pub fn allow_changing_from(&self, source: S, to: impl IntoIterator<Item = S>) {
        self.add_rule([source], to);
    }

    /// Register `name` as a transition from any of `from` to `to`, and add
    /// the matching rule.
    ///
    /// Ignored if `from` is empty. Registering a name again replaces it.
    pub fn add_named_transition(
        &self,
        name: impl Into<String>,
        from: impl IntoIterator<Item = S>,
        to: S,
    ) {
        let transition = NamedTransition::new(name, from, to);
        if transition.rule().starting_states().is_empty() {
            return;
        }
        self.worker().post(move |engine| engine.add_named(transition));
    }

    /// Snapshot of the rule table.
    pub fn rules(&self) -> Vec<Rule<S>> {
        self.worker().call(|engine| engine.rules())
    }

    /// Snapshot of the named transitions, in no particular order.
    pub fn named_transitions(&self) -> Vec<NamedTransition<S>> {
        self.worker().call(|engine| engine.named_transitions())
    }

    // ---- conditions ----

    /// Gate leaving any of `states` on `condition`.
    ///
    /// Conditions for a state run in the order they were added. The first
    /// error aborts the transition and is returned to the caller as is.
    ///
    /// Conditions run on the machine's worker thread and must not call
    /// back into the same machine synchronously.
    pub fn add_condition_before_leaving<F>(&self, states: impl IntoIterator<Item = S>, condition: F)
    where
        F: Fn(&TransitionContext<S, U>) -> Result<(), E> + Send + Sync + 'static,
    {
        let states: Vec<S> = states.into_iter().collect();
        if states.is_empty() {
            return;
        }
        let condition = Condition::new(condition);
        self.worker()
            .post(move |engine| engine.add_condition_before_leaving(states, condition));
    }

    /// Gate entering any of `states` on `condition`.
    ///
    /// Entering conditions run after all leaving conditions have passed.
    pub fn add_condition_before_entering<F>(&self, states: impl IntoIterator<Item = S>, condition: F)
    where
        F: Fn(&TransitionContext<S, U>) -> Result<(), E> + Send + Sync + 'static,
    {
        let states: Vec<S> = states.into_iter().collect();
        if states.is_empty() {
            return;
        }
        let condition = Condition::new(condition);
        self.worker()
            .post(move |engine| engine.add_condition_before_entering(states, condition));
    }

    // ---- actions ----

    /// Run `callback` on the default context after entering any of `states`.
    ///
    /// Each state holds one such action; adding another replaces it.
    pub fn add_action_after_entering<F>(&self, states: impl IntoIterator<Item = S>, callback: F)
    where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        self.set_action(ActionSlot::AfterEntering, states, Action::new(callback));
    }

    /// Like [`add_action_after_entering`](Self::add_action_after_entering),
    /// running on `context`.
    pub fn add_action_after_entering_on<F>(
        &self,
        states: impl IntoIterator<Item = S>,
        context: Arc<dyn DispatchContext>,
        callback: F,
    ) where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        self.set_action(ActionSlot::AfterEntering, states, Action::new(callback).on(context));
    }

    /// Run `callback` on the default context after leaving any of `states`.
    pub fn add_action_after_leaving<F>(&self, states: impl IntoIterator<Item = S>, callback: F)
    where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        self.set_action(ActionSlot::AfterLeaving, states, Action::new(callback));
    }

    pub fn add_action_after_leaving_on<F>(
        &self,
        states: impl IntoIterator<Item = S>,
        context: Arc<dyn DispatchContext>,
        callback: F,
    ) where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        self.set_action(ActionSlot::AfterLeaving, states, Action::new(callback).on(context));
    }

    /// Run `callback` on the default context after every committed change.
    pub fn add_action_after_any_change<F>(&self, callback: F)
    where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        let action = Action::new(callback);
        self.worker()
            .post(move |engine| engine.set_action(ActionSlot::AfterAny, Vec::new(), action));
    }

    pub fn add_action_after_any_change_on<F>(&self, context: Arc<dyn DispatchContext>, callback: F)
    where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        let action = Action::new(callback).on(context);
        self.worker()
            .post(move |engine| engine.set_action(ActionSlot::AfterAny, Vec::new(), action));
    }

    fn set_action(&self, slot: ActionSlot, states: impl IntoIterator<Item = S>, action: Action<S, U>) {
        let states: Vec<S> = states.into_iter().collect();
        if states.is_empty() {
            return;
        }
        self.worker()
            .post(move |engine| engine.set_action(slot, states, action));
    }

    // ---- transitions ----

    /// Check whether changing to `destination` would succeed right now.
    ///
    /// Runs the same checks as [`change_to`](Self::change_to), including
    /// conditions, without changing anything.
    pub fn can_change_to(&self, destination: S) -> Result<(), E> {
        self.check(destination, None)
    }

    pub fn can_change_to_with(&self, destination: S, user_info: U) -> Result<(), E> {
        self.check(destination, Some(Arc::new(user_info)))
    }

    /// Change to `destination`.
    ///
    /// The checks run before this returns and their errors come back here.
    /// The change itself is applied on the worker right after, and the
    /// matching actions are handed to their contexts in the order entering,
    /// leaving, any.
    pub fn change_to(&self, destination: S) -> Result<(), E> {
        self.change(destination, None)
    }

    pub fn change_to_with(&self, destination: S, user_info: U) -> Result<(), E> {
        self.change(destination, Some(Arc::new(user_info)))
    }

    /// Check the transition registered as `name`, returning its destination.
    pub fn can_perform_named(&self, name: &str) -> Result<S, E> {
        self.check_named(name, None)
    }

    pub fn can_perform_named_with(&self, name: &str, user_info: U) -> Result<S, E> {
        self.check_named(name, Some(Arc::new(user_info)))
    }

    /// Perform the transition registered as `name`.
    pub fn perform_named(&self, name: &str) -> Result<(), E> {
        self.perform(name, None)
    }

    pub fn perform_named_with(&self, name: &str, user_info: U) -> Result<(), E> {
        self.perform(name, Some(Arc::new(user_info)))
    }

    fn check(&self, destination: S, user_info: Option<Arc<U>>) -> Result<(), E> {
        self.worker()
            .call(move |engine| engine.check(destination, user_info).map(|_| ()))
    }

    fn check_named(&self, name: &str, user_info: Option<Arc<U>>) -> Result<S, E> {
        let name = name.to_string();
        self.worker().call(move |engine| -> Result<S, E> {
            let destination = engine.resolve(&name)?;
            engine.check(destination.clone(), user_info)?;
            Ok(destination)
        })
    }

    fn change(&self, destination: S, user_info: Option<Arc<U>>) -> Result<(), E> {
        self.worker()
            .call_then(move |engine| commit_if_allowed(engine.check(destination, user_info)))
    }

    fn perform(&self, name: &str, user_info: Option<Arc<U>>) -> Result<(), E> {
        let name = name.to_string();
        self.worker().call_then(move |engine| {
            let checked = engine
                .resolve(&name)
                .and_then(|destination| engine.check(destination, user_info));
            commit_if_allowed(checked)
        })
    }

    /// Handle that does not keep the machine alive.
    pub fn downgrade(&self) -> WeakStateMachine<S, U, E> {
        WeakStateMachine {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

/// Turn a check result into the caller's answer plus the commit to run
/// once the caller has been released.
#[allow(clippy::type_complexity)]
fn commit_if_allowed<S, U, E>(
    checked: Result<TransitionContext<S, U>, E>,
) -> (Result<(), E>, Option<Task<Engine<S, U, E>>>)
where
    S: State,
    U: Send + Sync + 'static,
    E: From<TransitionError> + Send + 'static,
{
    match checked {
        Ok(ctx) => {
            let commit: Task<Engine<S, U, E>> = Box::new(move |engine: &mut Engine<S, U, E>| engine.commit(ctx));
            (Ok(()), Some(commit))
        }
        Err(error) => (Err(error), None),
    }
}

impl<S: State, U, E> Clone for StateMachine<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: State, U, E> fmt::Debug for StateMachine<S, U, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

/// Non-owning reference to a [`StateMachine`].
///
/// This is a relation, not ownership: callbacks stored inside a machine
/// use it to call back into that machine without keeping it alive.
pub struct WeakStateMachine<S: State, U = (), E = TransitionError> {
    shared: Weak<Shared<S, U, E>>,
}

impl<S: State, U, E> WeakStateMachine<S, U, E> {
    /// The machine, if any strong handle still exists.
    pub fn upgrade(&self) -> Option<StateMachine<S, U, E>> {
        self.shared.upgrade().map(|shared| StateMachine { shared })
    }
}

impl<S: State, U, E> Clone for WeakStateMachine<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<S: State, U, E> fmt::Debug for WeakStateMachine<S, U, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStateMachine").finish_non_exhaustive()
    }
}
