//! State graph: an arena of states, each owning its outgoing transitions.

use crate::core::StateId;
use crate::effects::transition::Transition;
use std::collections::HashMap;
use tracing::warn;

/// A named state and the transitions leaving it, keyed by trigger.
pub struct StateNode<Ctx> {
    identifier: String,
    outgoing: HashMap<String, Transition<Ctx>>,
}

impl<Ctx> StateNode<Ctx> {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            outgoing: HashMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Register an outgoing transition.
    ///
    /// A state holds at most one transition per trigger: registering a second
    /// one replaces the first, which is returned.
    pub fn add_transition(&mut self, transition: Transition<Ctx>) -> Option<Transition<Ctx>> {
        let replaced = self
            .outgoing
            .insert(transition.trigger.clone(), transition);
        if let Some(previous) = &replaced {
            warn!(
                state = %self.identifier,
                trigger = %previous.trigger,
                "transition registered twice, keeping the last one"
            );
        }
        replaced
    }

    pub fn transition(&self, trigger: &str) -> Option<&Transition<Ctx>> {
        self.outgoing.get(trigger)
    }

    /// Triggers this state reacts to, in no particular order.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.outgoing.keys().map(String::as_str)
    }
}

/// Arena of states. Built once, immutable while a machine runs on it.
pub struct StateGraph<Ctx> {
    states: Vec<StateNode<Ctx>>,
}

impl<Ctx> StateGraph<Ctx> {
    pub(crate) fn from_nodes(states: Vec<StateNode<Ctx>>) -> Self {
        Self { states }
    }

    /// Node for an id handed out by the builder of this graph.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this graph.
    pub fn node(&self, id: StateId) -> &StateNode<Ctx> {
        &self.states[id.index()]
    }

    pub fn get(&self, id: StateId) -> Option<&StateNode<Ctx>> {
        self.states.get(id.index())
    }

    pub fn identifier(&self, id: StateId) -> &str {
        self.node(id).identifier()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
