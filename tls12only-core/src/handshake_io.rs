//! Handshake message framing and reassembly.
//!
//! ```text
//! struct {
//!     HandshakeType msg_type;
//!     uint24 length;
//!     opaque body[length];
//! } Handshake;
//! ```
//!
//! Handshake messages are independent of record boundaries: one record may
//! carry several messages and one message may span several records.

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::HandshakeType;
use bytes::{Buf, BufMut, BytesMut};

/// Handshake message header size (type + uint24 length).
pub const HANDSHAKE_HEADER_SIZE: usize = 4;

/// Largest handshake message accepted from a peer.
///
/// Certificate chains are the only large messages in a TLS 1.2 handshake.
pub const MAX_HANDSHAKE_MESSAGE_SIZE: usize = 64 * 1024;

/// Handshake message wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    /// Message type
    pub msg_type: HandshakeType,

    /// Message body (without the 4-byte header)
    pub payload: Vec<u8>,
}

impl HandshakeMessage {
    /// Create a new handshake message.
    pub fn new(msg_type: HandshakeType, payload: Vec<u8>) -> Self {
        Self { msg_type, payload }
    }

    /// Encode the handshake message, header included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = self.payload.len();
        if len > 0x00FF_FFFF {
            return Err(Error::InvalidMessage("Handshake message too large".into()));
        }

        let mut buf = BytesMut::with_capacity(HANDSHAKE_HEADER_SIZE + len);
        buf.put_u8(self.msg_type.to_u8());
        buf.put_uint(len as u64, 3);
        buf.put_slice(&self.payload);
        Ok(buf.to_vec())
    }

    /// Decode exactly one handshake message from `data`.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < HANDSHAKE_HEADER_SIZE {
            return Err(Error::InvalidMessage("Handshake message too short".into()));
        }

        let msg_type_raw = data.get_u8();
        let msg_type = HandshakeType::from_u8(msg_type_raw).ok_or_else(|| {
            Error::UnexpectedMessage(format!("Unknown handshake type: {}", msg_type_raw))
        })?;

        let length = data.get_uint(3) as usize;
        if data.len() != length {
            return Err(Error::InvalidMessage(format!(
                "Handshake length mismatch: header says {}, have {}",
                length,
                data.len()
            )));
        }

        Ok(Self {
            msg_type,
            payload: data.to_vec(),
        })
    }
}

/// Collects handshake record fragments and yields complete messages.
///
/// Each yielded item carries the raw encoded bytes as well, since the
/// transcript hash covers the exact bytes received.
#[derive(Debug, Default)]
pub struct HandshakeReassembler {
    buffer: BytesMut,
}

impl HandshakeReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the fragment of a handshake record.
    pub fn push(&mut self, fragment: &[u8]) {
        self.buffer.extend_from_slice(fragment);
    }

    /// True when no partial message is buffered.
    ///
    /// A ChangeCipherSpec must not arrive while a handshake message is
    /// half-received.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Pop the next complete message, if any.
    ///
    /// Returns the decoded message and its encoded form.
    pub fn next_message(&mut self) -> Result<Option<(HandshakeMessage, Vec<u8>)>> {
        if self.buffer.len() < HANDSHAKE_HEADER_SIZE {
            return Ok(None);
        }

        let length = (&self.buffer[1..HANDSHAKE_HEADER_SIZE]).get_uint(3) as usize;
        if length > MAX_HANDSHAKE_MESSAGE_SIZE {
            return Err(Error::ProtocolError(ProtocolError::DecodeError));
        }

        let total = HANDSHAKE_HEADER_SIZE + length;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let raw = self.buffer.split_to(total).to_vec();
        let message = HandshakeMessage::decode(&raw)?;
        Ok(Some((message, raw)))
    }
}
