//! Construction of state machines.
//!
//! This module provides the fluent machine builder, its errors and the
//! `state_enum!` macro for declaring state types with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
