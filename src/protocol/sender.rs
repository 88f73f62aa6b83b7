//! Background bulk sender for the data-source role.

use crate::protocol::channel::OutboundChannel;
use crate::protocol::datagram::Datagram;
use crate::protocol::store::{Payload, TransitionStore};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Streams the whole transition store as DATA datagrams.
///
/// Each pass writes from the head of the store until it is empty, then
/// sleeps for `interval` and checks again; items pushed meanwhile go out on
/// the next pass. An item leaves the store only once its write succeeded.
/// Once a pass ends with the store empty the sender stops.
pub struct BulkSender<T> {
    output: OutboundChannel,
    store: Arc<TransitionStore<T>>,
    interval: Duration,
}

impl<T: Payload> BulkSender<T> {
    pub fn new(output: OutboundChannel, store: Arc<TransitionStore<T>>, interval: Duration) -> Self {
        Self {
            output,
            store,
            interval,
        }
    }

    /// Run on a separate task and call `on_complete` once the store is empty.
    ///
    /// If the output fails the callback is not called; the unsent items stay
    /// queued.
    pub fn spawn<F>(self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        tokio::spawn(async move {
            match self.run().await {
                Ok(sent) => {
                    info!(sent, "bulk transfer finished");
                    on_complete();
                }
                Err(err) => warn!(
                    error = %err,
                    left = self.store.len(),
                    "bulk transfer stopped, output failed"
                ),
            }
        })
    }

    /// Send until the store stays empty. Returns the number of items written.
    ///
    /// An item that cannot be encoded is logged and dropped. A failed write
    /// stops the transfer and leaves that item at the head of the store.
    pub async fn run(&self) -> io::Result<usize> {
        let mut sent = 0;
        loop {
            let mut pass = 0;
            while let Some(encoded) = self.store.with_front(|item| Datagram::data(item)) {
                let datagram = match encoded {
                    Ok(datagram) => datagram,
                    Err(err) => {
                        warn!(error = %err, "failed to encode item, dropping it");
                        self.store.pop_front();
                        continue;
                    }
                };
                self.output.send(datagram).await?;
                self.store.pop_front();
                pass += 1;
            }
            debug!(items = pass, "bulk pass");
            sent += pass;

            tokio::time::sleep(self.interval).await;
            if self.store.is_empty() {
                return Ok(sent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{self, DatagramCodec, Inbound};
    use crate::protocol::signal::{CONTENT_TRANSITION, DATA};
    use futures::StreamExt;
    use tokio::sync::oneshot;
    use tokio_util::codec::FramedRead;

    fn item_of(inbound: Inbound) -> String {
        match inbound {
            Inbound::Datagram(d) => {
                assert_eq!(d.kind(), DATA);
                codec::decode(d.payload(CONTENT_TRANSITION).unwrap()).unwrap()
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn sends_every_item_then_completes_once() {
        let (local, remote) = tokio::io::duplex(4096);
        let store: Arc<TransitionStore<String>> =
            Arc::new(["A", "B", "C"].into_iter().map(String::from).collect());
        let sender = BulkSender::new(
            OutboundChannel::new(local),
            Arc::clone(&store),
            Duration::from_millis(5),
        );
        let (done_tx, done_rx) = oneshot::channel();

        let handle = sender.spawn(move || {
            done_tx.send(()).unwrap();
        });

        let mut peer = FramedRead::new(remote, DatagramCodec::new());
        let mut items = Vec::new();
        for _ in 0..3 {
            items.push(item_of(peer.next().await.unwrap().unwrap()));
        }
        done_rx.await.unwrap();
        handle.await.unwrap();

        assert_eq!(items, vec!["A", "B", "C"]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn items_queued_during_a_pass_go_out_next_pass() {
        let (local, remote) = tokio::io::duplex(4096);
        let store: Arc<TransitionStore<String>> = Arc::new(TransitionStore::new());
        store.push("first".to_string());
        let sender = BulkSender::new(
            OutboundChannel::new(local),
            Arc::clone(&store),
            Duration::from_millis(50),
        );

        let late = Arc::clone(&store);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            late.push("second".to_string());
        });

        let sent = sender.run().await.unwrap();

        let mut peer = FramedRead::new(remote, DatagramCodec::new());
        assert_eq!(sent, 2);
        assert_eq!(item_of(peer.next().await.unwrap().unwrap()), "first");
        assert_eq!(item_of(peer.next().await.unwrap().unwrap()), "second");
    }

    #[tokio::test]
    async fn empty_store_completes_without_writing() {
        let (local, _remote) = tokio::io::duplex(64);
        let sender: BulkSender<String> = BulkSender::new(
            OutboundChannel::new(local),
            Arc::new(TransitionStore::new()),
            Duration::from_millis(1),
        );

        assert_eq!(sender.run().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_unsent_items() {
        let (local, _remote) = tokio::io::duplex(64);
        let output = OutboundChannel::new(local);
        output.close().await.unwrap();
        let store: Arc<TransitionStore<String>> =
            Arc::new(["A", "B"].into_iter().map(String::from).collect());
        let sender = BulkSender::new(output, Arc::clone(&store), Duration::from_millis(1));

        assert!(sender.run().await.is_err());
        assert_eq!(store.snapshot(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn failed_transfer_does_not_signal_completion() {
        let (local, _remote) = tokio::io::duplex(64);
        let output = OutboundChannel::new(local);
        output.close().await.unwrap();
        let store: Arc<TransitionStore<String>> =
            Arc::new(["A"].into_iter().map(String::from).collect());
        let (done_tx, mut done_rx) = oneshot::channel::<()>();

        BulkSender::new(output, Arc::clone(&store), Duration::from_millis(1))
            .spawn(move || {
                let _ = done_tx.send(());
            })
            .await
            .unwrap();

        assert!(done_rx.try_recv().is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn aborting_mid_write_keeps_the_item() {
        let (local, _remote) = tokio::io::duplex(8);
        let store: Arc<TransitionStore<String>> =
            Arc::new(["A", "B"].into_iter().map(String::from).collect());
        let handle = BulkSender::new(
            OutboundChannel::new(local),
            Arc::clone(&store),
            Duration::from_millis(1),
        )
        .spawn(|| {});

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(store.snapshot(), vec!["A", "B"]);
    }
}
