//! State handles.
//!
//! States live in an arena owned by their [`crate::effects::StateGraph`];
//! everything else refers to them through a [`StateId`]. Transitions can
//! therefore point at any state, including the one that owns them, without
//! any ownership cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a state inside the graph that created it.
///
/// A `StateId` is only meaningful for the graph (or builder) that handed it
/// out. Identifiers are cheap to copy and compare.
///
/// # Example
///
/// ```rust
/// use heli_exchange::core::StateId;
///
/// let id = StateId::new(3);
/// assert_eq!(id.index(), 3);
/// assert_eq!(id.to_string(), "#3");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the state in its graph's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
