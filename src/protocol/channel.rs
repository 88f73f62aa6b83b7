//! Serialized output channel and the session shutdown handle.

use crate::protocol::codec::DatagramCodec;
use crate::protocol::datagram::Datagram;
use futures::SinkExt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type FrameSink = FramedWrite<BoxedWriter, DatagramCodec>;

/// Write side of a connection.
///
/// Every write holds one lock for encode, write and flush, so protocol
/// actions and the bulk sender never interleave frames. Cloning shares the
/// same underlying writer.
#[derive(Clone)]
pub struct OutboundChannel {
    sink: Arc<Mutex<Option<FrameSink>>>,
}

impl OutboundChannel {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: BoxedWriter = Box::new(writer);
        Self {
            sink: Arc::new(Mutex::new(Some(FramedWrite::new(writer, DatagramCodec::new())))),
        }
    }

    /// Write and flush one datagram.
    ///
    /// Fails with [`io::ErrorKind::NotConnected`] once the channel has been
    /// released.
    pub async fn send(&self, datagram: Datagram) -> io::Result<()> {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "output channel already released",
            ));
        };
        debug!(kind = datagram.kind(), "sending datagram");
        sink.send(datagram).await
    }

    /// Flush and shut down the writer.
    ///
    /// Returns `Ok(false)` if the channel was already released. The writer is
    /// dropped even when closing it fails.
    pub async fn close(&self) -> io::Result<bool> {
        let taken = self.sink.lock().await.take();
        match taken {
            Some(mut sink) => {
                sink.close().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.sink.lock().await.is_some()
    }
}

struct ShutdownState {
    listening: AtomicBool,
    released: AtomicBool,
    output: OutboundChannel,
}

/// Handle through which a session is told to stop.
///
/// Handed to actions at construction time; the orchestrator keeps a clone and
/// checks [`ShutdownHandle::is_listening`] between events.
#[derive(Clone)]
pub struct ShutdownHandle {
    state: Arc<ShutdownState>,
}

impl ShutdownHandle {
    pub fn new(output: OutboundChannel) -> Self {
        Self {
            state: Arc::new(ShutdownState {
                listening: AtomicBool::new(true),
                released: AtomicBool::new(false),
                output,
            }),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state.listening.load(Ordering::SeqCst)
    }

    /// Stop listening and release the output channel.
    ///
    /// Only the first call does any work and returns `true`; later calls are
    /// no-ops. A failure while releasing the output is logged, not returned.
    pub async fn trigger(&self) -> bool {
        self.state.listening.store(false, Ordering::SeqCst);
        if self.state.released.swap(true, Ordering::SeqCst) {
            debug!("shutdown already done");
            return false;
        }

        info!("shutting connection down");
        match self.state.output.close().await {
            Ok(_) => debug!("output stream released"),
            Err(err) => warn!(error = %err, "failed to release output stream"),
        }
        true
    }
}
