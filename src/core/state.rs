//! Core State trait for state machine states.
//!
//! The engine never inspects a state beyond comparing and hashing it, so any
//! plain value type qualifies: enums, integers, strings.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// States are compared by value, never by identity. The trait is
/// implemented automatically for every type meeting the bounds.
///
/// # Required Traits
///
/// - `Clone`: states are copied into transition contexts and callbacks
/// - `Eq` + `Hash`: states key the rule, condition and action tables
/// - `Debug`: states are rendered into error messages and logs
/// - `Send` + `Sync`: states cross into the machine's worker thread
///
/// # Example
///
/// ```rust
/// use stategate::core::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum TaskState {
///     Pending,
///     Running,
///     Complete,
/// }
///
/// fn assert_state<S: State>() {}
/// assert_state::<TaskState>();
/// assert_state::<String>();
/// assert_state::<u32>();
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Pending,
        Testing,
    }

    fn requires_state<S: State>(state: S) -> S {
        state
    }

    #[test]
    fn enums_are_states() {
        assert_eq!(requires_state(TestState::Pending), TestState::Pending);
    }

    #[test]
    fn strings_are_states() {
        let state = requires_state("One".to_string());
        assert_eq!(state, "One");
    }

    #[test]
    fn states_compare_by_value() {
        let mut seen = HashSet::new();
        seen.insert(TestState::Testing);

        assert!(seen.contains(&TestState::Testing.clone()));
        assert!(!seen.contains(&TestState::Pending));
    }
}
