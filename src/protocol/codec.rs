//! Wire codec for datagrams.
//!
//! Each datagram is bincode-encoded and sent as one length-delimited frame
//! (big-endian `u32` length prefix). Frames that arrive intact but do not
//! decode as a [`Datagram`] are surfaced as [`Inbound::Unknown`] rather than as
//! stream errors, so a noisy peer cannot tear the session down.

use crate::protocol::datagram::Datagram;
use bincode::Options;
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Largest frame accepted or produced, in bytes.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_FRAME_LEN as u64)
}

/// Encode a value with the wire's bincode settings.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    wire_options().serialize(value)
}

/// Decode a value encoded by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    wire_options().deserialize(bytes)
}

/// One decoded inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Datagram(Datagram),
    /// A frame that is not a datagram. Only its size and the decode error
    /// are kept.
    Unknown { len: usize, reason: String },
}

/// Tokio codec turning a byte stream into [`Inbound`] frames and
/// [`Datagram`]s into bytes.
#[derive(Debug)]
pub struct DatagramCodec {
    frames: LengthDelimitedCodec,
}

impl DatagramCodec {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .max_frame_length(MAX_FRAME_LEN)
                .new_codec(),
        }
    }
}

impl Default for DatagramCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DatagramCodec {
    type Item = Inbound;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>, io::Error> {
        let Some(frame) = self.frames.decode(src)? else {
            return Ok(None);
        };
        let inbound = match decode::<Datagram>(&frame) {
            Ok(datagram) => Inbound::Datagram(datagram),
            Err(err) => Inbound::Unknown {
                len: frame.len(),
                reason: err.to_string(),
            },
        };
        Ok(Some(inbound))
    }
}

impl Encoder<Datagram> for DatagramCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Datagram, dst: &mut BytesMut) -> Result<(), io::Error> {
        let bytes = encode(&item).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.frames.encode(Bytes::from(bytes), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::signal::{ACK, FIN};

    fn raw_frame(payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        LengthDelimitedCodec::new()
            .encode(Bytes::copy_from_slice(payload), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn encoded_datagram_decodes_back() {
        let mut codec = DatagramCodec::new();
        let mut buf = BytesMut::new();
        let datagram = Datagram::new(ACK).with_payload("k", vec![1, 2, 3]);

        codec.encode(datagram.clone(), &mut buf).unwrap();

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Inbound::Datagram(datagram))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut codec = DatagramCodec::new();
        let mut full = BytesMut::new();
        codec.encode(Datagram::new(FIN), &mut full).unwrap();

        let mut partial = full.split_to(full.len() - 1);
        assert_eq!(codec.decode(&mut partial).unwrap(), None);

        partial.extend_from_slice(&full);
        assert_eq!(
            codec.decode(&mut partial).unwrap(),
            Some(Inbound::Datagram(Datagram::new(FIN)))
        );
    }

    #[test]
    fn garbage_frame_is_reported_as_unknown() {
        let mut codec = DatagramCodec::new();
        let mut buf = raw_frame(&[0xff]);

        match codec.decode(&mut buf).unwrap() {
            Some(Inbound::Unknown { len, .. }) => assert_eq!(len, 1),
            other => panic!("expected unknown frame, got {other:?}"),
        }
    }

    #[test]
    fn frames_are_decoded_one_at_a_time() {
        let mut codec = DatagramCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Datagram::new(ACK), &mut buf).unwrap();
        buf.extend_from_slice(&raw_frame(&[]));
        codec.encode(Datagram::new(FIN), &mut buf).unwrap();

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Inbound::Datagram(Datagram::new(ACK)))
        );
        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(Inbound::Unknown { len: 0, .. })
        ));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Inbound::Datagram(Datagram::new(FIN)))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn items_use_the_wire_encoding() {
        let bytes = encode(&vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = decode(&bytes).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
