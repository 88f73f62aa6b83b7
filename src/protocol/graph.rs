//! The heli/DB-server protocol as a state graph.

use crate::builder::{BuildError, StateGraphBuilder};
use crate::effects::{SharedAction, StateMachine, Transition};
use crate::protocol::actions::{
    ReceiveData, SendControlSignal, SendData, ShutdownConnection, StartBulkSender,
};
use crate::protocol::config::PushStrategy;
use crate::protocol::context::SessionContext;
use crate::protocol::signal::*;
use crate::protocol::store::Payload;
use std::sync::Arc;

/// State identifiers of the protocol graph.
pub mod states {
    pub const START: &str = "start";
    pub const SYN: &str = "syn";
    pub const ACKED: &str = "acked";
    pub const WAIT_RX_MODE_ACK: &str = "waitRxModeAck";
    pub const RECEIVE_DATA: &str = "ReceiveData";
    pub const SEND_DATA: &str = "SendData";
    pub const FINISHED: &str = "finished";
}

fn send<T: Payload>(signal: &'static str) -> SharedAction<SessionContext<T>> {
    Arc::new(SendControlSignal::new(signal))
}

/// Build a machine for one session, positioned on `start`.
///
/// `strategy` decides who pushes items in the data-source role: the ACK
/// handler of `SendData` (one item per ACK) or a background bulk sender
/// started when the server accepts the mode.
pub fn build_machine<T: Payload>(
    strategy: PushStrategy,
) -> Result<StateMachine<SessionContext<T>>, BuildError> {
    let mut graph = StateGraphBuilder::new();
    let start = graph.state(states::START)?;
    let syn = graph.state(states::SYN)?;
    let acked = graph.state(states::ACKED)?;
    let wait_mode_ack = graph.state(states::WAIT_RX_MODE_ACK)?;
    let receive_data = graph.state(states::RECEIVE_DATA)?;
    let send_data = graph.state(states::SEND_DATA)?;
    let finished = graph.state(states::FINISHED)?;

    let send_data_action: SharedAction<SessionContext<T>> = Arc::new(SendData);
    let start_bulk: SharedAction<SessionContext<T>> = Arc::new(StartBulkSender);
    let receive: SharedAction<SessionContext<T>> = Arc::new(ReceiveData);
    let (on_mode_ack, on_data_ack) = match strategy {
        PushStrategy::PerAck => (
            Transition::on(RX_SERVER_ACK)
                .to(send_data)
                .action(Arc::clone(&send_data_action)),
            Transition::on(ACK).to(send_data).action(send_data_action),
        ),
        PushStrategy::Bulk => (
            Transition::on(RX_SERVER_ACK)
                .to(send_data)
                .action(start_bulk),
            Transition::on(ACK).to(send_data),
        ),
    };

    let shutdown: SharedAction<SessionContext<T>> = Arc::new(ShutdownConnection);

    graph
        .transition(start, Transition::on(SEND_SYN).to(syn).action(send(SYN)))?
        .transition(syn, Transition::on(ACK).to(acked).action(send(SYNACK)))?
        .transition(syn, Transition::on(SEND_SYN).to(syn).action(send(SYN)))?
        .transition(
            acked,
            Transition::on(SEND_MODE_SEND)
                .to(wait_mode_ack)
                .action(send(RX_SERVER)),
        )?
        .transition(
            acked,
            Transition::on(SEND_MODE_RECEIVE)
                .to(wait_mode_ack)
                .action(send(RX_HELI)),
        )?
        .transition(wait_mode_ack, Transition::on(RX_HELI_ACK).to(receive_data))?
        .transition(wait_mode_ack, on_mode_ack)?
        .transition(send_data, on_data_ack)?
        .transition(
            send_data,
            Transition::on(FINISH_RX_SERVER)
                .to(finished)
                .action(send(FIN)),
        )?
        .transition(
            receive_data,
            Transition::on(DATA)
                .to(receive_data)
                .action(receive),
        )?
        .transition(
            receive_data,
            Transition::on(FIN).to(finished).action(send(FINACK)),
        )?
        .transition(
            finished,
            Transition::on(FINACK).action(Arc::clone(&shutdown)),
        )?
        .transition(finished, Transition::on(SHUTDOWN).action(shutdown))?;

    graph.start(start).build()
}
