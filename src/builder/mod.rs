//! Builder API for wiring up state graphs.
//!
//! States are declared by identifier and referred to by the [`StateId`]
//! the builder returns; transitions are then attached state by state.
//!
//! # Example
//!
//! ```rust
//! use heli_exchange::builder::StateGraphBuilder;
//! use heli_exchange::core::Event;
//! use heli_exchange::effects::{StepResult, Transition};
//!
//! let mut builder = StateGraphBuilder::<()>::new();
//! let start = builder.state("start").unwrap();
//! let syn = builder.state("syn").unwrap();
//! builder.transition(start, Transition::on("sendSyn").to(syn)).unwrap();
//!
//! let mut machine = builder.start(start).build().unwrap();
//! let result = futures::executor::block_on(machine.handle_event(&(), Event::new("sendSyn")));
//!
//! assert!(matches!(result, Ok(StepResult::Transitioned { .. })));
//! assert_eq!(machine.current_state(), "syn");
//! ```
//!
//! [`StateId`]: crate::core::StateId

pub mod error;
pub mod graph;

pub use error::BuildError;
pub use graph::StateGraphBuilder;
