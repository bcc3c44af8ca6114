//! Transition legality rules.
//!
//! A rule legalizes every move from one of its starting states to one of its
//! destination states. A table with no rules at all legalizes everything, so
//! a fresh machine starts out open.

use super::state::State;
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A set of starting states paired with a set of destination states.
///
/// Equality is structural on both sets; element order never matters.
///
/// # Example
///
/// ```rust
/// use stategate::core::Rule;
///
/// let rule = Rule::new(["Testing"], ["Passed", "Failed"]);
/// assert!(rule.covers(&"Testing", &"Failed"));
/// assert!(!rule.covers(&"Passed", &"Failed"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))
)]
pub struct Rule<S: State> {
    starting: HashSet<S>,
    destinations: HashSet<S>,
}

impl<S: State> Rule<S> {
    pub fn new(
        starting: impl IntoIterator<Item = S>,
        destinations: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            starting: starting.into_iter().collect(),
            destinations: destinations.into_iter().collect(),
        }
    }

    pub fn starting_states(&self) -> &HashSet<S> {
        &self.starting
    }

    pub fn destination_states(&self) -> &HashSet<S> {
        &self.destinations
    }

    /// True when `from -> to` is one of the moves this rule legalizes.
    pub fn covers(&self, from: &S, to: &S) -> bool {
        self.destinations.contains(to) && self.starting.contains(from)
    }

    fn is_empty(&self) -> bool {
        self.starting.is_empty() || self.destinations.is_empty()
    }
}

/// De-duplicated collection of rules.
#[derive(Clone, Debug)]
pub struct RuleTable<S: State> {
    rules: Vec<Rule<S>>,
}

impl<S: State> Default for RuleTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> RuleTable<S> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule. Returns `false` when the rule has an empty side or an
    /// identical rule is already present.
    pub fn add(&mut self, rule: Rule<S>) -> bool {
        if rule.is_empty() || self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Whether `from -> to` is legal. An empty table allows every move.
    pub fn allows(&self, from: &S, to: &S) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|rule| rule.covers(from, to))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule<S>> {
        self.rules.iter()
    }
}
