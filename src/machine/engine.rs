//! The mutable state behind a machine handle.
//!
//! An `Engine` is only ever touched from its machine's worker thread, so
//! none of its methods need locking.

use super::error::TransitionError;
use crate::core::{
    Condition, ConditionRegistry, NamedTransition, NamedTransitionTable, Rule, RuleTable, State,
    TransitionContext,
};
use crate::effects::{Action, ActionRegistry, DispatchContext};
use std::sync::Arc;
use uuid::Uuid;

/// Which action table a registration targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActionSlot {
    AfterEntering,
    AfterLeaving,
    AfterAny,
}

pub(crate) struct Engine<S: State, U, E> {
    label: String,
    id: Uuid,
    current: S,
    rules: RuleTable<S>,
    named: NamedTransitionTable<S>,
    conditions: ConditionRegistry<S, U, E>,
    actions: ActionRegistry<S, U>,
    default_context: Arc<dyn DispatchContext>,
}

impl<S, U, E> Engine<S, U, E>
where
    S: State,
    U: Send + Sync + 'static,
    E: From<TransitionError>,
{
    pub(crate) fn new(
        label: String,
        id: Uuid,
        initial: S,
        default_context: Arc<dyn DispatchContext>,
    ) -> Self {
        Self {
            label,
            id,
            current: initial,
            rules: RuleTable::new(),
            named: NamedTransitionTable::new(),
            conditions: ConditionRegistry::new(),
            actions: ActionRegistry::new(),
            default_context,
        }
    }

    pub(crate) fn current(&self) -> &S {
        &self.current
    }

    pub(crate) fn add_rule(&mut self, rule: Rule<S>) {
        if self.rules.add(rule) {
            tracing::trace!(machine = %self.label, id = %self.id, rules = self.rules.len(), "rule added");
        }
    }

    pub(crate) fn add_named(&mut self, transition: NamedTransition<S>) {
        let rule = transition.rule().clone();
        tracing::trace!(machine = %self.label, id = %self.id, name = transition.name(), "named transition added");
        self.named.insert(transition);
        self.add_rule(rule);
    }

    pub(crate) fn add_condition_before_leaving(&mut self, states: Vec<S>, condition: Condition<S, U, E>) {
        tracing::trace!(machine = %self.label, id = %self.id, ?states, "condition added before leaving");
        self.conditions.add_before_leaving(states, condition);
    }

    pub(crate) fn add_condition_before_entering(&mut self, states: Vec<S>, condition: Condition<S, U, E>) {
        tracing::trace!(machine = %self.label, id = %self.id, ?states, "condition added before entering");
        self.conditions.add_before_entering(states, condition);
    }

    pub(crate) fn set_action(&mut self, slot: ActionSlot, states: Vec<S>, action: Action<S, U>) {
        tracing::trace!(machine = %self.label, id = %self.id, ?slot, ?states, "action registered");
        match slot {
            ActionSlot::AfterEntering => self.actions.set_after_entering(states, action),
            ActionSlot::AfterLeaving => self.actions.set_after_leaving(states, action),
            ActionSlot::AfterAny => self.actions.set_after_any(action),
        }
    }

    /// Validate a change from the current state to `to`.
    ///
    /// Order: same-state, rule table, leaving conditions, entering
    /// conditions. Nothing is mutated.
    pub(crate) fn check(
        &self,
        to: S,
        user_info: Option<Arc<U>>,
    ) -> Result<TransitionContext<S, U>, E> {
        if self.current == to {
            return Err(TransitionError::already_in(&to).into());
        }
        if !self.rules.allows(&self.current, &to) {
            return Err(TransitionError::unsupported(&self.current, &to).into());
        }

        let ctx = TransitionContext::new(self.current.clone(), to, user_info);
        self.conditions.check_all(&ctx)?;
        Ok(ctx)
    }

    /// Destination of the transition registered as `name`.
    pub(crate) fn resolve(&self, name: &str) -> Result<S, E> {
        self.named
            .get(name)
            .map(|transition| transition.destination().clone())
            .ok_or_else(|| TransitionError::UnknownTransitionName(name.to_string()).into())
    }

    /// Apply a checked transition and hand its actions to their contexts.
    pub(crate) fn commit(&mut self, ctx: TransitionContext<S, U>) {
        self.current = ctx.to.clone();
        let span = tracing::debug_span!("commit", machine = %self.label, id = %self.id);
        let scheduled = span.in_scope(|| self.actions.dispatch(&ctx, &self.default_context));
        tracing::debug!(
            machine = %self.label,
            id = %self.id,
            from = ?ctx.from,
            to = ?ctx.to,
            actions = scheduled,
            "transition committed"
        );
    }

    pub(crate) fn rules(&self) -> Vec<Rule<S>> {
        self.rules.iter().cloned().collect()
    }

    pub(crate) fn named_transitions(&self) -> Vec<NamedTransition<S>> {
        self.named.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Job;

    struct Discard;

    impl DispatchContext for Discard {
        fn dispatch(&self, _job: Job) {}
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Pending,
        Testing,
        Passed,
    }

    use TestState::*;

    fn engine() -> Engine<TestState, (), TransitionError> {
        Engine::new("test".to_string(), Uuid::new_v4(), Pending, Arc::new(Discard))
    }

    #[test]
    fn same_state_is_rejected_before_rules_and_conditions() {
        let mut engine = engine();
        engine.add_rule(Rule::new([Testing], [Passed]));
        engine.add_condition_before_leaving(
            vec![Pending],
            Condition::new(|_| Err(TransitionError::Rejected("never".into()))),
        );

        assert!(matches!(
            engine.check(Pending, None),
            Err(TransitionError::AlreadyInRequestedState { .. })
        ));
    }

    #[test]
    fn rules_are_checked_before_conditions() {
        let mut engine = engine();
        engine.add_rule(Rule::new([Testing], [Passed]));
        engine.add_condition_before_leaving(
            vec![Pending],
            Condition::new(|_| Err(TransitionError::Rejected("never".into()))),
        );

        assert!(matches!(
            engine.check(Passed, None),
            Err(TransitionError::UnsupportedTransition { .. })
        ));
    }

    #[test]
    fn failed_check_leaves_state_alone() {
        let mut engine = engine();
        engine.add_condition_before_entering(
            vec![Testing],
            Condition::new(|_| Err(TransitionError::Rejected("busy".into()))),
        );

        assert_eq!(
            engine.check(Testing, None).unwrap_err(),
            TransitionError::Rejected("busy".into())
        );
        assert_eq!(engine.current(), &Pending);
    }

    #[test]
    fn commit_moves_to_the_destination() {
        let mut engine = engine();
        let ctx = engine.check(Testing, None).unwrap();
        engine.commit(ctx);

        assert_eq!(engine.current(), &Testing);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn engine_events_carry_the_machine_id() {
        let id = Uuid::new_v4();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut engine: Engine<TestState, (), TransitionError> =
                Engine::new("shared-name".to_string(), id, Pending, Arc::new(Discard));
            engine.add_rule(Rule::new([Pending], [Testing]));
            let ctx = engine.check(Testing, None).unwrap();
            engine.commit(ctx);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines.iter().any(|line| line.contains("rule added")));
        assert!(lines.iter().any(|line| line.contains("transition committed")));
        for line in lines {
            assert!(line.contains(&id.to_string()), "missing id in: {line}");
        }
    }

    #[test]
    fn named_transitions_also_add_their_rule() {
        let mut engine = engine();
        engine.add_named(NamedTransition::new("start", [Pending], Testing));

        assert_eq!(engine.resolve("start").unwrap(), Testing);
        assert_eq!(engine.rules(), vec![Rule::new([Pending], [Testing])]);
        assert!(matches!(
            engine.resolve("stop"),
            Err(TransitionError::UnknownTransitionName(name)) if name == "stop"
        ));
    }
}
