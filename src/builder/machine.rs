//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::State;
use crate::effects::{DispatchContext, SerialQueue};
use crate::machine::{StateMachine, TransitionError};
use std::marker::PhantomData;
use std::sync::Arc;

const DEFAULT_NAME: &str = "state-machine";

/// Builder for configuring a state machine before it starts.
///
/// # Example
///
/// ```rust
/// use stategate::builder::StateMachineBuilder;
/// use stategate::effects::SerialQueue;
/// use stategate::StateMachine;
/// use std::sync::Arc;
///
/// let ui = Arc::new(SerialQueue::new("ui").unwrap());
/// let machine: StateMachine<&str> = StateMachineBuilder::new()
///     .initial("Locked")
///     .name("turnstile")
///     .default_context(ui)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.name(), "turnstile");
/// ```
pub struct StateMachineBuilder<S: State, U = (), E = TransitionError> {
    initial: Option<S>,
    name: Option<String>,
    default_context: Option<Arc<dyn DispatchContext>>,
    _phantom: PhantomData<fn() -> (U, E)>,
}

impl<S, U, E> StateMachineBuilder<S, U, E>
where
    S: State,
    U: Send + Sync + 'static,
    E: From<TransitionError> + Send + 'static,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            name: None,
            default_context: None,
            _phantom: PhantomData,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Name used for the machine's threads and in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Context for actions registered without one.
    ///
    /// Defaults to a serial queue owned by the machine.
    pub fn default_context(mut self, context: Arc<dyn DispatchContext>) -> Self {
        self.default_context = Some(context);
        self
    }

    /// Start the machine.
    /// Returns an error if the initial state is missing or a thread cannot
    /// be spawned.
    pub fn build(self) -> Result<StateMachine<S, U, E>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());

        let default_context = match self.default_context {
            Some(context) => context,
            None => Arc::new(SerialQueue::new(format!("{name}-actions"))?),
        };

        StateMachine::start(name, initial, default_context)
    }
}

impl<S, U, E> Default for StateMachineBuilder<S, U, E>
where
    S: State,
    U: Send + Sync + 'static,
    E: From<TransitionError> + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
