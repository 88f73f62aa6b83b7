//! Builder for constructing state graphs and the machines that run them.

use crate::builder::error::BuildError;
use crate::core::StateId;
use crate::effects::{StateGraph, StateMachine, StateNode, Transition};

/// Builder that hands out [`StateId`]s while the graph is being wired up.
///
/// States are declared first, then transitions are attached to them. Targets
/// may point anywhere in the graph, including back at the source state.
pub struct StateGraphBuilder<Ctx> {
    nodes: Vec<StateNode<Ctx>>,
    start: Option<StateId>,
    transitions: usize,
}

impl<Ctx: Send + Sync> StateGraphBuilder<Ctx> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            start: None,
            transitions: 0,
        }
    }

    /// Declare a state. Identifiers must be unique within the graph.
    pub fn state(&mut self, identifier: &str) -> Result<StateId, BuildError> {
        if self.nodes.iter().any(|n| n.identifier() == identifier) {
            return Err(BuildError::DuplicateState(identifier.to_string()));
        }
        self.nodes.push(StateNode::new(identifier));
        Ok(StateId::new(self.nodes.len() - 1))
    }

    /// Attach a transition to `from`.
    ///
    /// A second transition for the same trigger replaces the first.
    pub fn transition(
        &mut self,
        from: StateId,
        transition: Transition<Ctx>,
    ) -> Result<&mut Self, BuildError> {
        if let Some(target) = transition.target {
            self.check(target)?;
        }
        self.check(from)?;
        if self.nodes[from.index()].add_transition(transition).is_none() {
            self.transitions += 1;
        }
        Ok(self)
    }

    /// Set the start state (required).
    pub fn start(mut self, state: StateId) -> Self {
        self.start = Some(state);
        self
    }

    /// Build the machine, positioned on the start state.
    pub fn build(self) -> Result<StateMachine<Ctx>, BuildError> {
        let start = self.start.ok_or(BuildError::MissingStartState)?;
        self.check(start)?;

        if self.transitions == 0 {
            return Err(BuildError::NoTransitions);
        }

        Ok(StateMachine::new(StateGraph::from_nodes(self.nodes), start))
    }

    fn check(&self, id: StateId) -> Result<(), BuildError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(BuildError::UnknownState(id))
        }
    }
}

impl<Ctx: Send + Sync> Default for StateGraphBuilder<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}
