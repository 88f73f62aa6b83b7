//! State transition history tracking.
//!
//! Every transition the engine fires is appended here with its trigger and a
//! timestamp, giving a replayable trail of the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single fired transition.
///
/// `from` and `to` are state identifiers. For a transition without a target
/// state `to` equals `from`.
///
/// # Example
///
/// ```rust
/// use heli_exchange::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "start".to_string(),
///     to: "syn".to_string(),
///     trigger: "sendSyn".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert!(transition.changed_state());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being transitioned from
    pub from: String,
    /// The state being transitioned to
    pub to: String,
    /// Event type that fired the transition
    pub trigger: String,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    /// Whether the transition moved the machine to a different state.
    pub fn changed_state(&self) -> bool {
        self.from != self.to
    }
}

/// Ordered history of fired transitions.
///
/// # Example
///
/// ```rust
/// use heli_exchange::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition {
///     from: "start".into(),
///     to: "syn".into(),
///     trigger: "sendSyn".into(),
///     timestamp: Utc::now(),
/// });
/// history.record(StateTransition {
///     from: "syn".into(),
///     to: "acked".into(),
///     trigger: "ACK".into(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec!["start", "syn", "acked"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a transition.
    pub fn record(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the initial state, then the `to` state of each transition.
    /// Self-loops and target-less transitions show up as repeated entries.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Triggers of every fired transition, in order.
    pub fn triggers(&self) -> Vec<&str> {
        self.transitions.iter().map(|t| t.trigger.as_str()).collect()
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
