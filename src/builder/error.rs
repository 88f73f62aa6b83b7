//! Build errors for state graphs.

use crate::core::StateId;
use thiserror::Error;

/// Errors that can occur when building a state graph.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Start state not specified. Call .start(state) before .build()")]
    MissingStartState,

    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("State '{0}' is already defined")]
    DuplicateState(String),

    #[error("State {0} does not belong to this graph")]
    UnknownState(StateId),
}
