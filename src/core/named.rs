//! Transitions addressable by name.

use super::rules::Rule;
use super::state::State;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A rule with exactly one destination, registered under a name.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))
)]
pub struct NamedTransition<S: State> {
    name: String,
    destination: S,
    rule: Rule<S>,
}

impl<S: State> NamedTransition<S> {
    pub fn new(
        name: impl Into<String>,
        starting: impl IntoIterator<Item = S>,
        destination: S,
    ) -> Self {
        let rule = Rule::new(starting, [destination.clone()]);
        Self {
            name: name.into(),
            destination,
            rule,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &S {
        &self.destination
    }

    pub fn rule(&self) -> &Rule<S> {
        &self.rule
    }
}

/// Named transitions by name. Registering a name again replaces it.
#[derive(Clone, Debug)]
pub struct NamedTransitionTable<S: State> {
    transitions: HashMap<String, NamedTransition<S>>,
}

impl<S: State> Default for NamedTransitionTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> NamedTransitionTable<S> {
    pub fn new() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// Store `transition`, returning the entry it replaced.
    pub fn insert(&mut self, transition: NamedTransition<S>) -> Option<NamedTransition<S>> {
        self.transitions
            .insert(transition.name.clone(), transition)
    }

    pub fn get(&self, name: &str) -> Option<&NamedTransition<S>> {
        self.transitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedTransition<S>> {
        self.transitions.values()
    }
}
