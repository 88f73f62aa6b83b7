//! State machine that dispatches events to effectful transitions.

use crate::builder::BuildError;
use crate::core::{Event, StateHistory, StateId, StateTransition};
use crate::effects::action::Outcome;
use crate::effects::graph::StateGraph;
use crate::effects::transition::TransitionError;
use chrono::Utc;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Longest chain of follow-up events a single `handle_event` call may fire.
pub const MAX_FOLLOW_UPS: usize = 32;

/// Result of handling one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// A transition fired and moved the machine (possibly back to the same state)
    Transitioned { from: String, to: String },

    /// A target-less transition fired; the state is unchanged
    Stayed { state: String },

    /// The current state has no transition for the event
    Unhandled { state: String },
}

impl StepResult {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled { .. })
    }
}

/// Event-driven state machine over a [`StateGraph`].
///
/// The machine has no internal locking: it expects a single caller driving
/// `handle_event`. Actions run to completion before the state changes, and a
/// failing action leaves the current state untouched.
pub struct StateMachine<Ctx> {
    graph: StateGraph<Ctx>,
    current: StateId,
    history: StateHistory,
}

impl<Ctx: Send + Sync> StateMachine<Ctx> {
    /// Create a machine positioned on `start`.
    pub fn new(graph: StateGraph<Ctx>, start: StateId) -> Self {
        Self {
            graph,
            current: start,
            history: StateHistory::new(),
        }
    }

    /// Reposition the machine without firing anything.
    ///
    /// Ids that do not belong to this machine's graph are rejected.
    pub fn set_start_state(&mut self, start: StateId) -> Result<(), BuildError> {
        if self.graph.get(start).is_none() {
            return Err(BuildError::UnknownState(start));
        }
        self.current = start;
        Ok(())
    }

    /// Identifier of the current state.
    pub fn current_state(&self) -> &str {
        self.graph.identifier(self.current)
    }

    pub fn current_id(&self) -> StateId {
        self.current
    }

    pub fn is_in(&self, identifier: &str) -> bool {
        self.current_state() == identifier
    }

    pub fn graph(&self) -> &StateGraph<Ctx> {
        &self.graph
    }

    /// Get state history (pure)
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Feed one event into the machine.
    ///
    /// Returns the result for `event` itself. Follow-up events raised by
    /// actions are handled afterwards, in order; an error from any of them is
    /// returned, but transitions that already fired stay applied.
    pub async fn handle_event(
        &mut self,
        ctx: &Ctx,
        event: Event,
    ) -> Result<StepResult, TransitionError> {
        let (result, follow_up) = self.fire(ctx, &event).await?;

        let mut pending: VecDeque<Event> = follow_up.into_iter().collect();
        let mut chained = 0;
        while let Some(next) = pending.pop_front() {
            chained += 1;
            if chained > MAX_FOLLOW_UPS {
                return Err(TransitionError::FollowUpOverflow {
                    event: next.kind().to_string(),
                    limit: MAX_FOLLOW_UPS,
                });
            }
            let (step, follow_up) = self.fire(ctx, &next).await?;
            trace!(event = %next, ?step, "follow-up event handled");
            pending.extend(follow_up);
        }

        Ok(result)
    }

    async fn fire(
        &mut self,
        ctx: &Ctx,
        event: &Event,
    ) -> Result<(StepResult, Option<Event>), TransitionError> {
        let from = self.current;
        let node = self.graph.node(from);

        let Some(transition) = node.transition(event.kind()) else {
            debug!(state = node.identifier(), %event, "no transition for event");
            return Ok((
                StepResult::Unhandled {
                    state: node.identifier().to_string(),
                },
                None,
            ));
        };

        let target = transition.target;
        let outcome = match &transition.action {
            Some(action) => {
                action
                    .execute(ctx, event)
                    .await
                    .map_err(|source| TransitionError::ActionFailed {
                        state: node.identifier().to_string(),
                        event: event.kind().to_string(),
                        action: action.name().to_string(),
                        source,
                    })?
            }
            None => Outcome::Done,
        };

        if let Some(target) = target {
            self.current = target;
        }

        let from_name = self.graph.identifier(from).to_string();
        let to_name = self.current_state().to_string();
        self.history.record(StateTransition {
            from: from_name.clone(),
            to: to_name.clone(),
            trigger: event.kind().to_string(),
            timestamp: Utc::now(),
        });
        debug!(from = %from_name, to = %to_name, %event, "transition fired");

        let step = if target.is_some() {
            StepResult::Transitioned {
                from: from_name,
                to: to_name,
            }
        } else {
            StepResult::Stayed { state: from_name }
        };

        let follow_up = match outcome {
            Outcome::Done => None,
            Outcome::Raise(next) => Some(next),
        };
        Ok((step, follow_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateGraphBuilder;
    use crate::effects::action::{ActionError, FnAction, SharedAction};
    use crate::effects::transition::Transition;
    use std::sync::{Arc, Mutex};

    type Log = Mutex<Vec<String>>;

    fn log(name: &'static str) -> SharedAction<Log> {
        Arc::new(FnAction::new(name, move |ctx: &Log, _: &Event| {
            ctx.lock().unwrap().push(name.to_string());
            Ok(Outcome::Done)
        }))
    }

    fn failing() -> SharedAction<Log> {
        Arc::new(FnAction::new("fail", |_: &Log, _: &Event| {
            Err(ActionError::Failed("broken pipe".to_string()))
        }))
    }

    fn raise(kind: &'static str) -> SharedAction<Log> {
        Arc::new(FnAction::new("raise", move |_: &Log, _: &Event| {
            Ok(Outcome::Raise(Event::new(kind)))
        }))
    }

    #[tokio::test]
    async fn matching_event_moves_to_target() {
        let mut builder = StateGraphBuilder::new();
        let start = builder.state("start").unwrap();
        let syn = builder.state("syn").unwrap();
        builder
            .transition(start, Transition::on("sendSyn").to(syn).action(log("SYN")))
            .unwrap();
        let mut machine = builder.start(start).build().unwrap();
        let ctx = Log::default();

        let result = machine.handle_event(&ctx, Event::new("sendSyn")).await.unwrap();

        assert_eq!(
            result,
            StepResult::Transitioned {
                from: "start".into(),
                to: "syn".into()
            }
        );
        assert!(machine.is_in("syn"));
        assert_eq!(*ctx.lock().unwrap(), vec!["SYN"]);
    }

    #[tokio::test]
    async fn unmatched_event_is_a_no_op() {
        let mut builder = StateGraphBuilder::new();
        let start = builder.state("start").unwrap();
        let syn = builder.state("syn").unwrap();
        builder
            .transition(start, Transition::on("sendSyn").to(syn).action(log("SYN")))
            .unwrap();
        let mut machine = builder.start(start).build().unwrap();
        let ctx = Log::default();

        let result = machine.handle_event(&ctx, Event::new("ACK")).await.unwrap();

        assert_eq!(
            result,
            StepResult::Unhandled {
                state: "start".into()
            }
        );
        assert!(!result.is_handled());
        assert!(machine.is_in("start"));
        assert!(machine.history().is_empty());
        assert!(ctx.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn absent_target_keeps_state() {
        let mut builder = StateGraphBuilder::new();
        let finished = builder.state("finished").unwrap();
        builder
            .transition(finished, Transition::on("FINACK").action(log("shutdown")))
            .unwrap();
        let mut machine = builder.start(finished).build().unwrap();
        let ctx = Log::default();

        let result = machine.handle_event(&ctx, Event::new("FINACK")).await.unwrap();

        assert_eq!(
            result,
            StepResult::Stayed {
                state: "finished".into()
            }
        );
        assert!(machine.is_in("finished"));
        assert_eq!(*ctx.lock().unwrap(), vec!["shutdown"]);
    }

    #[tokio::test]
    async fn failed_action_leaves_state_unchanged() {
        let mut builder = StateGraphBuilder::new();
        let syn = builder.state("syn").unwrap();
        let acked = builder.state("acked").unwrap();
        builder
            .transition(syn, Transition::on("ACK").to(acked).action(failing()))
            .unwrap();
        let mut machine = builder.start(syn).build().unwrap();
        let ctx = Log::default();

        let err = machine.handle_event(&ctx, Event::new("ACK")).await.unwrap_err();

        assert!(matches!(
            err,
            TransitionError::ActionFailed { ref state, ref event, .. } if state == "syn" && event == "ACK"
        ));
        assert!(machine.is_in("syn"));
        assert!(machine.history().is_empty());
    }

    #[tokio::test]
    async fn raised_event_fires_after_state_change() {
        let mut builder = StateGraphBuilder::new();
        let sending = builder.state("SendData").unwrap();
        let finished = builder.state("finished").unwrap();
        builder
            .transition(sending, Transition::on("ACK").to(sending).action(raise("FINISH")))
            .unwrap();
        builder
            .transition(sending, Transition::on("FINISH").to(finished).action(log("FIN")))
            .unwrap();
        let mut machine = builder.start(sending).build().unwrap();
        let ctx = Log::default();

        let result = machine.handle_event(&ctx, Event::new("ACK")).await.unwrap();

        assert_eq!(
            result,
            StepResult::Transitioned {
                from: "SendData".into(),
                to: "SendData".into()
            }
        );
        assert!(machine.is_in("finished"));
        assert_eq!(machine.history().triggers(), vec!["ACK", "FINISH"]);
        assert_eq!(*ctx.lock().unwrap(), vec!["FIN"]);
    }

    #[tokio::test]
    async fn endless_follow_ups_are_cut_off() {
        let mut builder = StateGraphBuilder::new();
        let looping = builder.state("loop").unwrap();
        builder
            .transition(looping, Transition::on("again").action(raise("again")))
            .unwrap();
        let mut machine = builder.start(looping).build().unwrap();
        let ctx = Log::default();

        let err = machine.handle_event(&ctx, Event::new("again")).await.unwrap_err();

        assert!(matches!(
            err,
            TransitionError::FollowUpOverflow { limit, .. } if limit == MAX_FOLLOW_UPS
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_the_last() {
        let mut builder = StateGraphBuilder::new();
        let start = builder.state("start").unwrap();
        let first = builder.state("first").unwrap();
        let second = builder.state("second").unwrap();
        builder
            .transition(start, Transition::on("go").to(first))
            .unwrap();
        builder
            .transition(start, Transition::on("go").to(second))
            .unwrap();
        let mut machine = builder.start(start).build().unwrap();

        machine.handle_event(&Log::default(), Event::new("go")).await.unwrap();

        assert!(machine.is_in("second"));
    }

    #[tokio::test]
    async fn set_start_state_repositions_without_history() {
        let mut builder = StateGraphBuilder::<Log>::new();
        let start = builder.state("start").unwrap();
        let other = builder.state("other").unwrap();
        builder
            .transition(start, Transition::on("go").to(other))
            .unwrap();
        let mut machine = builder.start(start).build().unwrap();

        machine.set_start_state(other).unwrap();

        assert!(machine.is_in("other"));
        assert_eq!(machine.current_id(), other);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn set_start_state_rejects_foreign_ids() {
        let mut builder = StateGraphBuilder::<Log>::new();
        let start = builder.state("start").unwrap();
        builder.transition(start, Transition::on("go")).unwrap();
        let mut machine = builder.start(start).build().unwrap();
        let foreign = StateId::new(42);

        assert_eq!(
            machine.set_start_state(foreign),
            Err(BuildError::UnknownState(foreign))
        );
        assert_eq!(machine.current_state(), "start");
    }
}
