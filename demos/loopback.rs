//! Loopback Exchange
//!
//! Runs a scripted DB server on localhost and a source-mode exchange
//! against it. The server accepts the handshake, acknowledges every item
//! and closes after FINACK.
//!
//! Run with: cargo run --example loopback
//! Set RUST_LOG=debug to see every transition.

use futures::{SinkExt, StreamExt};
use heli_exchange::protocol::codec;
use heli_exchange::protocol::signal::*;
use heli_exchange::protocol::{
    Datagram, DatagramCodec, Exchange, ExchangeConfig, Inbound, PeerDirectory, TransitionStore,
};
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn Error + Send + Sync>;

/// Minimal DB server: answers each signal the way a real server would and
/// collects the items it receives.
async fn db_server(listener: TcpListener) -> Result<Vec<String>, BoxError> {
    let (socket, peer) = listener.accept().await?;
    println!("[server] accepted {peer}");
    let mut framed = Framed::new(socket, DatagramCodec::new());
    let mut received = Vec::new();

    while let Some(frame) = framed.next().await {
        let datagram = match frame? {
            Inbound::Datagram(datagram) => datagram,
            Inbound::Unknown { len, .. } => {
                println!("[server] skipping {len} byte frame");
                continue;
            }
        };

        let reply = match datagram.kind() {
            SYN => Some(ACK),
            SYNACK => None,
            RX_SERVER => Some(RX_SERVER_ACK),
            RX_HELI => Some(RX_HELI_ACK),
            DATA => {
                if let Some(bytes) = datagram.payload(CONTENT_TRANSITION) {
                    let item: String = codec::decode(bytes)?;
                    println!("[server] got {item:?}");
                    received.push(item);
                }
                Some(ACK)
            }
            FIN => Some(FINACK),
            other => {
                println!("[server] ignoring {other}");
                None
            }
        };

        if let Some(kind) = reply {
            framed.send(Datagram::new(kind)).await?;
        }
    }

    println!("[server] client closed the connection");
    Ok(received)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    println!("=== Loopback Exchange ===\n");

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let port = listener.local_addr()?.port();
    let server = tokio::spawn(db_server(listener));

    let store: Arc<TransitionStore<String>> = Arc::new(
        ["takeoff", "hover", "landing"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    let config = ExchangeConfig {
        port,
        ..ExchangeConfig::default()
    };
    let exchange = Exchange::new(
        config,
        Arc::clone(&store),
        PeerDirectory::from_peers([IpAddr::V4(Ipv4Addr::LOCALHOST)]),
    );

    let report = exchange.start().await?;
    let received = server.await??;

    println!("\nSession {} ended in '{}'", report.session_id, report.final_state);
    println!("End: {:?}", report.end);
    println!("Path: {}", report.history.get_path().join(" -> "));
    println!("Server received: {received:?}");
    println!("Items left in store: {}", store.len());
    Ok(())
}
