//! The heli/DB-server exchange protocol.
//!
//! A session walks a small handshake (SYN, ACK, SYNACK), announces which
//! side sends data, moves items one way and closes with FIN/FINACK. Every
//! step is a transition of the graph built by [`build_machine`]; the
//! [`Exchange`] owns the connection and feeds inbound datagrams to it.

pub mod actions;
pub mod channel;
pub mod codec;
pub mod config;
pub mod context;
pub mod datagram;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod sender;
pub mod signal;
pub mod store;

pub use channel::{OutboundChannel, ShutdownHandle};
pub use codec::{DatagramCodec, Inbound, MAX_FRAME_LEN};
pub use config::{DiscoveryConfig, ExchangeConfig, Mode, PushStrategy, DEFAULT_DB_SERVER_PORT};
pub use context::SessionContext;
pub use datagram::Datagram;
pub use discovery::{wait_for_peer, PeerDirectory};
pub use error::{ConfigError, ExchangeError, ParseModeError};
pub use exchange::{Exchange, SessionEnd, SessionReport};
pub use graph::{build_machine, states};
pub use sender::BulkSender;
pub use store::{Payload, TransitionStore};
