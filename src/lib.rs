//! Stategate: a thread-safe finite state machine
//!
//! A machine holds one current state of a user-chosen type and only moves
//! between states when its rules and conditions agree. Committed changes
//! fire actions on dispatch contexts chosen per action.
//!
//! # Core Concepts
//!
//! - **Rules**: which source states may change to which destinations
//!   (no rules means every change is allowed)
//! - **Conditions**: fallible gates checked before leaving or entering a state
//! - **Actions**: callbacks run after entering, after leaving, or after any change
//! - **Named transitions**: a name bound to a destination and its own rule
//!
//! # Example
//!
//! ```rust
//! use stategate::{state_enum, StateMachine, TransitionError};
//!
//! state_enum! {
//!     enum Build {
//!         Pending,
//!         Testing,
//!         Passed,
//!         Failed,
//!     }
//! }
//!
//! let machine: StateMachine<Build> = StateMachine::new(Build::Pending).unwrap();
//! machine.add_rule([Build::Pending], [Build::Testing]);
//! machine.add_named_transition("finish", [Build::Testing], Build::Passed);
//! machine.add_condition_before_entering([Build::Testing], |ctx| {
//!     if ctx.from == Build::Pending {
//!         Ok(())
//!     } else {
//!         Err(TransitionError::Rejected("tests need a pending build".into()))
//!     }
//! });
//! machine.add_action_after_entering([Build::Passed], |ctx| {
//!     println!("{} -> {}", ctx.from, ctx.to);
//! });
//!
//! machine.change_to(Build::Testing).unwrap();
//! machine.perform_named("finish").unwrap();
//! assert_eq!(machine.current_state(), Build::Passed);
//! ```

pub mod builder;
pub mod core;
pub mod effects;
mod machine;
mod worker;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use core::{NamedTransition, Rule, State, TransitionContext};
pub use effects::{DispatchContext, SerialQueue};
#[cfg(feature = "tokio")]
pub use effects::TokioContext;
pub use machine::{StateMachine, TransitionError, WeakStateMachine};
