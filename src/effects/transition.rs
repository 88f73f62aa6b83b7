//! Transitions between states and the errors firing them can produce.

use crate::core::StateId;
use crate::effects::action::{ActionError, SharedAction};
use std::fmt;
use std::sync::Arc;

/// Errors that can occur while handling an event.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Action '{action}' failed in state '{state}' on event '{event}': {source}")]
    ActionFailed {
        state: String,
        event: String,
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("Event '{event}' exceeded the limit of {limit} chained follow-up events")]
    FollowUpOverflow { event: String, limit: usize },
}

/// An outgoing edge of a state.
///
/// `target = None` runs the action and leaves the machine where it is.
pub struct Transition<Ctx> {
    pub trigger: String,
    pub target: Option<StateId>,
    pub action: Option<SharedAction<Ctx>>,
}

impl<Ctx> Transition<Ctx> {
    /// Transition fired by `trigger`, with no target and no action yet.
    pub fn on(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            target: None,
            action: None,
        }
    }

    pub fn to(mut self, target: StateId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn action(mut self, action: SharedAction<Ctx>) -> Self {
        self.action = Some(action);
        self
    }

    /// Whether firing this transition can change the current state.
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

impl<Ctx> Clone for Transition<Ctx> {
    fn clone(&self) -> Self {
        Self {
            trigger: self.trigger.clone(),
            target: self.target,
            action: self.action.as_ref().map(Arc::clone),
        }
    }
}

impl<Ctx: Send + Sync> fmt::Debug for Transition<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("trigger", &self.trigger)
            .field("target", &self.target)
            .field("action", &self.action.as_ref().map(|a| a.name().to_string()))
            .finish()
    }
}
