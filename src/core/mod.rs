//! Core state machine types.
//!
//! This module contains the plain data the engine works with:
//! - Events and their opaque parameters
//! - State handles into a graph arena
//! - Transition history tracking
//!
//! Nothing in here performs I/O; side effects live in [`crate::effects`].

mod event;
mod history;
mod state;

pub use event::{Event, Parameter};
pub use history::{StateHistory, StateTransition};
pub use state::StateId;
