//! Message and event type names.
//!
//! Wire types travel inside datagrams between the helicopter and the DB
//! server. Local types are only ever injected by this side into its own
//! state machine.

// Wire types.
pub const SYN: &str = "SYN";
pub const ACK: &str = "ACK";
pub const SYNACK: &str = "SYNACK";
pub const RX_SERVER: &str = "RX_SERVER";
pub const RX_HELI: &str = "RX_HELI";
pub const RX_SERVER_ACK: &str = "RX_SERVER_ACK";
pub const RX_HELI_ACK: &str = "RX_HELI_ACK";
pub const DATA: &str = "DATA";
pub const FIN: &str = "FIN";
pub const FINACK: &str = "FINACK";

// Local types.
pub const SEND_SYN: &str = "sendSyn";
pub const SEND_MODE_SEND: &str = "sendMode_send";
pub const SEND_MODE_RECEIVE: &str = "sendMode_receive";
pub const FINISH_RX_SERVER: &str = "FINISH_RX_SERVER";
pub const SHUTDOWN: &str = "SHUTDOWN";

/// Payload key under which a DATA datagram carries its item.
pub const CONTENT_TRANSITION: &str = "transition";
