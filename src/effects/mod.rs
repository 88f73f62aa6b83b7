//! Effectful state machine operations.
//!
//! This module is the imperative shell around the plain types in
//! [`crate::core`]: transitions carry actions that perform I/O, and the
//! machine runs them when events arrive.
//!
//! # Key Concepts
//!
//! - **Actions**: async side effects run against a caller-supplied context
//! - **Transitions**: trigger, optional target state, optional action
//! - **Graph**: arena of states, each owning its outgoing transitions
//! - **State Machine**: dispatches events and tracks history

mod action;
mod graph;
mod machine;
mod transition;

pub use action::{Action, ActionError, FnAction, Outcome, SharedAction};
pub use graph::{StateGraph, StateNode};
pub use machine::{StateMachine, StepResult, MAX_FOLLOW_UPS};
pub use transition::{Transition, TransitionError};
