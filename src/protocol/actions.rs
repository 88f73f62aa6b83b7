//! Actions fired by the protocol's transitions.

use crate::core::Event;
use crate::effects::{Action, ActionError, Outcome};
use crate::protocol::codec;
use crate::protocol::context::SessionContext;
use crate::protocol::datagram::Datagram;
use crate::protocol::signal::{CONTENT_TRANSITION, FINISH_RX_SERVER};
use crate::protocol::store::Payload;
use async_trait::async_trait;
use tracing::{debug, error, info};

/// Write a payload-less control datagram.
#[derive(Debug, Clone)]
pub struct SendControlSignal {
    signal: &'static str,
}

impl SendControlSignal {
    pub fn new(signal: &'static str) -> Self {
        Self { signal }
    }

    pub fn signal(&self) -> &'static str {
        self.signal
    }
}

#[async_trait]
impl<T: Payload> Action<SessionContext<T>> for SendControlSignal {
    fn name(&self) -> &str {
        self.signal
    }

    async fn execute(&self, ctx: &SessionContext<T>, _event: &Event) -> Result<Outcome, ActionError> {
        info!(signal = self.signal, "Sending>");
        ctx.output()
            .send(Datagram::new(self.signal))
            .await
            .map_err(|err| {
                error!(signal = self.signal, error = %err, "failed to send control signal");
                ActionError::Io(err)
            })?;
        Ok(Outcome::Done)
    }
}

/// Send the next queued item, or raise `FINISH_RX_SERVER` once the queue is
/// empty.
#[derive(Debug, Clone, Default)]
pub struct SendData;

#[async_trait]
impl<T: Payload> Action<SessionContext<T>> for SendData {
    fn name(&self) -> &str {
        "send-data"
    }

    async fn execute(&self, ctx: &SessionContext<T>, _event: &Event) -> Result<Outcome, ActionError> {
        let Some(item) = ctx.store().pop_front() else {
            info!("nothing left to send");
            return Ok(Outcome::Raise(Event::new(FINISH_RX_SERVER)));
        };

        let datagram = match Datagram::data(&item) {
            Ok(datagram) => datagram,
            Err(err) => {
                ctx.store().push_front(item);
                return Err(err.into());
            }
        };
        if let Err(err) = ctx.output().send(datagram).await {
            ctx.store().push_front(item);
            return Err(err.into());
        }
        debug!(remaining = ctx.store().len(), "item sent");
        Ok(Outcome::Done)
    }
}

/// Decode the item carried by a DATA event and append it to the store.
#[derive(Debug, Clone, Default)]
pub struct ReceiveData;

#[async_trait]
impl<T: Payload> Action<SessionContext<T>> for ReceiveData {
    fn name(&self) -> &str {
        "receive-data"
    }

    async fn execute(&self, ctx: &SessionContext<T>, event: &Event) -> Result<Outcome, ActionError> {
        let bytes = event
            .parameter(CONTENT_TRANSITION)
            .ok_or_else(|| ActionError::MissingParameter {
                event: event.kind().to_string(),
                key: CONTENT_TRANSITION.to_string(),
            })?;
        let item: T = codec::decode(bytes)?;
        ctx.store().push(item);
        debug!(stored = ctx.store().len(), "item received");
        Ok(Outcome::Done)
    }
}

/// Trigger the session's shutdown handle.
#[derive(Debug, Clone, Default)]
pub struct ShutdownConnection;

#[async_trait]
impl<T: Payload> Action<SessionContext<T>> for ShutdownConnection {
    fn name(&self) -> &str {
        "shutdown"
    }

    async fn execute(&self, ctx: &SessionContext<T>, _event: &Event) -> Result<Outcome, ActionError> {
        ctx.shutdown().trigger().await;
        Ok(Outcome::Done)
    }
}

/// Hand the data phase over to the background bulk sender.
#[derive(Debug, Clone, Default)]
pub struct StartBulkSender;

#[async_trait]
impl<T: Payload> Action<SessionContext<T>> for StartBulkSender {
    fn name(&self) -> &str {
        "start-bulk-sender"
    }

    async fn execute(&self, ctx: &SessionContext<T>, _event: &Event) -> Result<Outcome, ActionError> {
        ctx.start_bulk_sender();
        Ok(Outcome::Done)
    }
}
