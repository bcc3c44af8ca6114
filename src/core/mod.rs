//! Core state machine types and logic.
//!
//! This module contains the side-effect-free pieces of the engine:
//! - State values via the `State` trait
//! - Transition rules and the rule table
//! - Condition gates evaluated before a transition
//! - Named transitions
//!
//! Nothing in here touches threads or dispatch contexts; the machine
//! module owns these structures and serializes access to them.

mod context;
mod guard;
mod named;
mod rules;
mod state;

pub use context::TransitionContext;
pub use guard::{Condition, ConditionRegistry};
pub use named::{NamedTransition, NamedTransitionTable};
pub use rules::{Rule, RuleTable};
pub use state::State;
