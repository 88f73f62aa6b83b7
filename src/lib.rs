//! Heli exchange: an event-driven state machine engine and the data
//! exchange protocol a helicopter client speaks with a DB server.
//!
//! The engine keeps plain state in [`core`] and runs async actions from
//! [`effects`]; graphs are wired up with [`builder`]. The [`protocol`]
//! module builds the handshake graph on top and drives it over a TCP
//! connection.
//!
//! # Core Concepts
//!
//! - **Events**: a type name plus opaque byte parameters
//! - **Transitions**: trigger, optional target state, optional async action
//! - **History**: every fired transition, timestamped
//! - **Exchange**: discovery, connect, receive loop and teardown of one session
//!
//! # Example
//!
//! ```rust
//! use heli_exchange::core::Event;
//! use heli_exchange::protocol::{build_machine, states, PushStrategy};
//!
//! let machine = build_machine::<String>(PushStrategy::PerAck).unwrap();
//! assert_eq!(machine.current_state(), states::START);
//! assert_eq!(Event::new("ACK").kind(), "ACK");
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod protocol;

// Re-export commonly used types
pub use builder::{BuildError, StateGraphBuilder};
pub use core::{Event, StateHistory, StateId, StateTransition};
pub use effects::{Action, ActionError, Outcome, StateMachine, StepResult, Transition, TransitionError};
pub use protocol::{Exchange, ExchangeConfig, ExchangeError, Mode, PushStrategy, SessionReport};
