//! Post-commit actions and the order they are scheduled in.

use super::dispatch::DispatchContext;
use crate::core::{State, TransitionContext};
use crate::worker::panic_message;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Callback fired after a transition commits.
pub type ActionFn<S, U> = Arc<dyn Fn(&TransitionContext<S, U>) + Send + Sync>;

/// A callback plus the context it should run on.
///
/// Without an explicit context the machine's default context is used.
pub struct Action<S: State, U> {
    callback: ActionFn<S, U>,
    context: Option<Arc<dyn DispatchContext>>,
}

impl<S: State, U: Send + Sync + 'static> Action<S, U> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&TransitionContext<S, U>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            context: None,
        }
    }

    /// Run this action on `context` instead of the machine default.
    pub fn on(mut self, context: Arc<dyn DispatchContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Hand the callback to its context. Returns without waiting for it.
    pub fn schedule(&self, ctx: &TransitionContext<S, U>, fallback: &Arc<dyn DispatchContext>) {
        let callback = Arc::clone(&self.callback);
        let ctx = ctx.clone();
        self.context
            .as_ref()
            .unwrap_or(fallback)
            .dispatch(Box::new(move || callback(&ctx)));
    }
}

impl<S: State, U> Clone for Action<S, U> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            context: self.context.clone(),
        }
    }
}

/// Single-slot action tables: one per destination state, one per source
/// state and one for any change. Registering again replaces the slot.
pub struct ActionRegistry<S: State, U> {
    after_entering: HashMap<S, Action<S, U>>,
    after_leaving: HashMap<S, Action<S, U>>,
    after_any: Option<Action<S, U>>,
}

impl<S: State, U> Default for ActionRegistry<S, U> {
    fn default() -> Self {
        Self {
            after_entering: HashMap::new(),
            after_leaving: HashMap::new(),
            after_any: None,
        }
    }
}

impl<S: State, U: Send + Sync + 'static> ActionRegistry<S, U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_after_entering(&mut self, states: impl IntoIterator<Item = S>, action: Action<S, U>) {
        for state in states {
            self.after_entering.insert(state, action.clone());
        }
    }

    pub fn set_after_leaving(&mut self, states: impl IntoIterator<Item = S>, action: Action<S, U>) {
        for state in states {
            self.after_leaving.insert(state, action.clone());
        }
    }

    pub fn set_after_any(&mut self, action: Action<S, U>) {
        self.after_any = Some(action);
    }

    /// Schedule the actions for a committed transition: entering `ctx.to`,
    /// then leaving `ctx.from`, then the any-change slot. Returns how many
    /// were scheduled.
    ///
    /// This fixes the hand-off order only. Actions on different contexts
    /// may finish in any order. A context that runs a job inline and lets
    /// it panic does not stop the remaining slots from being scheduled.
    pub fn dispatch(&self, ctx: &TransitionContext<S, U>, fallback: &Arc<dyn DispatchContext>) -> usize {
        let slots = [
            ("after_entering", self.after_entering.get(&ctx.to)),
            ("after_leaving", self.after_leaving.get(&ctx.from)),
            ("after_any", self.after_any.as_ref()),
        ];

        let mut scheduled = 0;
        for (slot, action) in slots {
            if let Some(action) = action {
                tracing::trace!(slot, from = ?ctx.from, to = ?ctx.to, "scheduling action");
                if let Err(payload) =
                    panic::catch_unwind(AssertUnwindSafe(|| action.schedule(ctx, fallback)))
                {
                    tracing::error!(
                        slot,
                        from = ?ctx.from,
                        to = ?ctx.to,
                        panic = panic_message(payload.as_ref()),
                        "action panicked while being scheduled"
                    );
                }
                scheduled += 1;
            }
        }
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Job;
    use std::sync::Mutex;

    /// Runs jobs on the spot and remembers how many it saw.
    #[derive(Default)]
    struct Inline {
        seen: Mutex<usize>,
    }

    impl DispatchContext for Inline {
        fn dispatch(&self, job: Job) {
            *self.seen.lock().unwrap() += 1;
            job();
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging(log: &Log, label: &str) -> Action<&'static str, u32> {
        let log = Arc::clone(log);
        let label = label.to_string();
        Action::new(move |ctx: &TransitionContext<&'static str, u32>| {
            log.lock().unwrap().push(format!(
                "{label}:{}->{}:{:?}",
                ctx.from,
                ctx.to,
                ctx.user_info()
            ));
        })
    }

    #[test]
    fn actions_are_scheduled_entering_leaving_any() {
        let log = Log::default();
        let default: Arc<dyn DispatchContext> = Arc::new(Inline::default());
        let mut registry = ActionRegistry::new();
        registry.set_after_any(logging(&log, "any"));
        registry.set_after_leaving(["Pending"], logging(&log, "leaving"));
        registry.set_after_entering(["Testing"], logging(&log, "entering"));

        let ctx = TransitionContext::new("Pending", "Testing", Some(Arc::new(8000)));
        assert_eq!(registry.dispatch(&ctx, &default), 3);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "entering:Pending->Testing:Some(8000)",
                "leaving:Pending->Testing:Some(8000)",
                "any:Pending->Testing:Some(8000)",
            ]
        );
    }

    #[test]
    fn unregistered_slots_are_skipped() {
        let log = Log::default();
        let default: Arc<dyn DispatchContext> = Arc::new(Inline::default());
        let mut registry = ActionRegistry::new();
        registry.set_after_entering(["Passed"], logging(&log, "entering"));

        let ctx = TransitionContext::new("Pending", "Testing", None);
        assert_eq!(registry.dispatch(&ctx, &default), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn later_registration_replaces_the_slot() {
        let log = Log::default();
        let default: Arc<dyn DispatchContext> = Arc::new(Inline::default());
        let mut registry = ActionRegistry::new();
        registry.set_after_entering(["Testing"], logging(&log, "first"));
        registry.set_after_entering(["Testing"], logging(&log, "second"));

        registry.dispatch(&TransitionContext::new("Pending", "Testing", None), &default);

        assert_eq!(*log.lock().unwrap(), vec!["second:Pending->Testing:None"]);
    }

    #[test]
    fn a_panicking_inline_action_does_not_skip_later_slots() {
        let log = Log::default();
        let default: Arc<dyn DispatchContext> = Arc::new(Inline::default());
        let mut registry = ActionRegistry::new();
        registry.set_after_entering(
            ["Testing"],
            Action::new(|_: &TransitionContext<&'static str, u32>| panic!("boom")),
        );
        registry.set_after_any(logging(&log, "any"));

        let ctx = TransitionContext::new("Pending", "Testing", None);
        assert_eq!(registry.dispatch(&ctx, &default), 2);

        assert_eq!(*log.lock().unwrap(), vec!["any:Pending->Testing:None"]);
    }

    #[test]
    fn explicit_context_overrides_the_fallback() {
        let log = Log::default();
        let fallback = Arc::new(Inline::default());
        let custom = Arc::new(Inline::default());
        let fallback_dyn: Arc<dyn DispatchContext> = fallback.clone();

        let mut registry = ActionRegistry::new();
        registry.set_after_entering(["Testing"], logging(&log, "entering").on(custom.clone()));
        registry.set_after_any(logging(&log, "any"));

        registry.dispatch(&TransitionContext::new("Pending", "Testing", None), &fallback_dyn);

        assert_eq!(*custom.seen.lock().unwrap(), 1);
        assert_eq!(*fallback.seen.lock().unwrap(), 1);
    }
}
