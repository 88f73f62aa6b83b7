//! The typed message envelope exchanged with the DB server.

use crate::core::Event;
use crate::protocol::codec;
use crate::protocol::signal::{CONTENT_TRANSITION, DATA};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{ kind, payload }` message. Control datagrams have an empty payload; DATA
/// datagrams carry one encoded item under [`CONTENT_TRANSITION`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datagram {
    kind: String,
    payload: BTreeMap<String, Vec<u8>>,
}

impl Datagram {
    /// Payload-less datagram of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: BTreeMap::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// DATA datagram wrapping `item`.
    pub fn data<T: Serialize>(item: &T) -> Result<Self, bincode::Error> {
        Ok(Self::new(DATA).with_payload(CONTENT_TRANSITION, codec::encode(item)?))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self, key: &str) -> Option<&[u8]> {
        self.payload.get(key).map(Vec::as_slice)
    }
}

impl From<Datagram> for Event {
    /// Event type is the datagram type; parameters are its payload entries.
    fn from(datagram: Datagram) -> Self {
        Event::with_parameters(datagram.kind, datagram.payload)
    }
}
