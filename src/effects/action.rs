//! Side-effecting actions run when a transition fires.

use crate::core::Event;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Errors raised by an action while it executes.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event '{event}' carries no parameter '{key}'")]
    MissingParameter { event: String, key: String },

    #[error("Payload codec failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("{0}")]
    Failed(String),
}

/// What an action asks the engine to do once its transition is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing further.
    Done,
    /// Fire this event next, after the current transition's state change.
    Raise(Event),
}

/// A side effect attached to a transition.
///
/// Actions receive the session context by reference on every call; they hold
/// no back-pointer to the machine that runs them. An action that needs the
/// machine to move on returns [`Outcome::Raise`] instead of calling back in.
#[async_trait]
pub trait Action<Ctx: Send + Sync>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &Ctx, event: &Event) -> Result<Outcome, ActionError>;
}

/// Shared handle to an action. One action may serve several transitions.
pub type SharedAction<Ctx> = Arc<dyn Action<Ctx>>;

type ActionFn<Ctx> = dyn Fn(&Ctx, &Event) -> Result<Outcome, ActionError> + Send + Sync;

/// Action backed by a synchronous closure.
///
/// # Example
///
/// ```rust
/// use heli_exchange::core::Event;
/// use heli_exchange::effects::{Action, FnAction, Outcome};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let counter = AtomicUsize::new(0);
/// let count = FnAction::new("count", |ctx: &AtomicUsize, _event: &Event| {
///     ctx.fetch_add(1, Ordering::SeqCst);
///     Ok(Outcome::Done)
/// });
///
/// let outcome = futures::executor::block_on(count.execute(&counter, &Event::new("tick")));
/// assert_eq!(outcome.unwrap(), Outcome::Done);
/// assert_eq!(counter.load(Ordering::SeqCst), 1);
/// ```
pub struct FnAction<Ctx> {
    name: String,
    f: Box<ActionFn<Ctx>>,
}

impl<Ctx> FnAction<Ctx> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Ctx, &Event) -> Result<Outcome, ActionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl<Ctx> fmt::Debug for FnAction<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<Ctx: Send + Sync> Action<Ctx> for FnAction<Ctx> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &Ctx, event: &Event) -> Result<Outcome, ActionError> {
        (self.f)(ctx, event)
    }
}
