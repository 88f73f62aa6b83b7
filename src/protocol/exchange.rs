//! Session orchestration: discovery, connect, receive loop, teardown.

use crate::core::{Event, StateHistory};
use crate::effects::StateMachine;
use crate::protocol::channel::OutboundChannel;
use crate::protocol::codec::{DatagramCodec, Inbound};
use crate::protocol::config::{ExchangeConfig, Mode};
use crate::protocol::context::SessionContext;
use crate::protocol::discovery::{wait_for_peer, PeerDirectory};
use crate::protocol::error::ExchangeError;
use crate::protocol::graph::{build_machine, states};
use crate::protocol::signal::SEND_SYN;
use crate::protocol::store::{Payload, TransitionStore};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

type Session<T> = StateMachine<SessionContext<T>>;

/// How the receive loop ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SessionEnd {
    /// The protocol shut the connection down itself.
    Completed,
    /// The peer closed its side before the protocol finished.
    PeerClosed,
    ReadFailed(String),
    ReadTimedOut,
}

/// Summary of one finished session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub mode: Mode,
    pub final_state: String,
    pub end: SessionEnd,
    pub history: StateHistory,
}

impl SessionReport {
    /// Whether the handshake ran through to `finished`.
    pub fn reached_finished(&self) -> bool {
        self.final_state == states::FINISHED
    }
}

/// One side of the heli/DB-server exchange.
///
/// In source mode the items in `store` are sent to the server; in sink mode
/// received items are appended to it. The store outlives the session, so the
/// caller can read what came in afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use heli_exchange::protocol::{Exchange, ExchangeConfig, PeerDirectory, TransitionStore};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), heli_exchange::protocol::ExchangeError> {
/// let store: Arc<TransitionStore<String>> =
///     Arc::new(["first", "second"].into_iter().map(String::from).collect());
/// let peers = PeerDirectory::from_peers(["192.168.0.10".parse().unwrap()]);
///
/// let report = Exchange::new(ExchangeConfig::default(), store, peers).start().await?;
/// println!("session ended in {}", report.final_state);
/// # Ok(())
/// # }
/// ```
pub struct Exchange<T> {
    config: ExchangeConfig,
    store: Arc<TransitionStore<T>>,
    peers: PeerDirectory,
}

impl<T: Payload> Exchange<T> {
    pub fn new(config: ExchangeConfig, store: Arc<TransitionStore<T>>, peers: PeerDirectory) -> Self {
        Self {
            config,
            store,
            peers,
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TransitionStore<T>> {
        &self.store
    }

    /// Wait for a DB server, connect to it over TCP and run one session.
    pub async fn start(&self) -> Result<SessionReport, ExchangeError> {
        let peer = wait_for_peer(&self.peers, &self.config.discovery).await?;
        let addr = SocketAddr::new(peer, self.config.port);

        info!(%addr, "connecting to DB server");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ExchangeError::Connect { addr, source })?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "could not disable Nagle");
        }

        self.run_on(stream).await
    }

    /// Run one session over an already connected stream.
    pub async fn run_on<S>(&self, stream: S) -> Result<SessionReport, ExchangeError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let session_id = Uuid::new_v4();
        self.session(stream, session_id)
            .instrument(info_span!("session", id = %session_id))
            .await
    }

    async fn session<S>(&self, stream: S, session_id: Uuid) -> Result<SessionReport, ExchangeError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let mut machine: Session<T> = build_machine(self.config.push_strategy)?;
        let (reader, writer) = tokio::io::split(stream);
        let (local_tx, mut local_rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(OutboundChannel::new(writer), Arc::clone(&self.store), local_tx)
            .with_session_id(session_id)
            .with_bulk_interval(self.config.bulk_interval());
        let mut input = FramedRead::new(reader, DatagramCodec::new());

        info!(
            mode = %self.config.mode,
            strategy = ?self.config.push_strategy,
            queued = self.store.len(),
            "session started"
        );
        self.feed(&mut machine, &ctx, Event::new(SEND_SYN)).await;

        let end = self
            .listen(&mut machine, &ctx, &mut input, &mut local_rx)
            .await;

        ctx.stop_bulk_sender();
        ctx.shutdown().trigger().await;
        drop(input);
        info!(?end, state = machine.current_state(), "connection released");

        Ok(SessionReport {
            session_id,
            mode: self.config.mode,
            final_state: machine.current_state().to_string(),
            end,
            history: machine.history().clone(),
        })
    }

    async fn listen<R>(
        &self,
        machine: &mut Session<T>,
        ctx: &SessionContext<T>,
        input: &mut FramedRead<R, DatagramCodec>,
        local: &mut mpsc::UnboundedReceiver<Event>,
    ) -> SessionEnd
    where
        R: AsyncRead + Unpin,
    {
        let read_timeout = self.config.read_timeout();
        while ctx.shutdown().is_listening() {
            tokio::select! {
                biased;

                Some(event) = local.recv() => {
                    debug!(%event, "local event");
                    self.feed(machine, ctx, event).await;
                }
                inbound = next_inbound(input, read_timeout) => match inbound {
                    Ok(Some(Ok(Inbound::Datagram(datagram)))) => {
                        info!(kind = datagram.kind(), "Received<");
                        self.feed(machine, ctx, datagram.into()).await;
                    }
                    Ok(Some(Ok(Inbound::Unknown { len, reason }))) => {
                        warn!(len, %reason, "discarding frame that is not a datagram");
                    }
                    Ok(Some(Err(err))) => {
                        error!(error = %err, "failed to read from DB server");
                        return SessionEnd::ReadFailed(err.to_string());
                    }
                    Ok(None) => {
                        info!("DB server closed the connection");
                        return SessionEnd::PeerClosed;
                    }
                    Err(_) => {
                        warn!(timeout = ?read_timeout, "DB server went silent");
                        return SessionEnd::ReadTimedOut;
                    }
                },
            }
        }
        SessionEnd::Completed
    }

    /// Hand one event to the machine, then negotiate the role if the
    /// handshake just reached `acked`.
    async fn feed(&self, machine: &mut Session<T>, ctx: &SessionContext<T>, event: Event) {
        match machine.handle_event(ctx, event).await {
            Ok(step) => trace!(?step, "event handled"),
            Err(err) => error!(error = %err, "event failed"),
        }

        if machine.is_in(states::ACKED) {
            let negotiation = Event::new(self.config.mode.negotiation_event());
            info!(mode = %self.config.mode, "announcing role");
            if let Err(err) = machine.handle_event(ctx, negotiation).await {
                error!(error = %err, "role negotiation failed");
            }
        }
    }
}

async fn next_inbound<R>(
    input: &mut FramedRead<R, DatagramCodec>,
    limit: Option<Duration>,
) -> Result<Option<io::Result<Inbound>>, Elapsed>
where
    R: AsyncRead + Unpin,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, input.next()).await,
        None => Ok(input.next().await),
    }
}
