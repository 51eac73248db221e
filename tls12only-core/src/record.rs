//! TLS 1.2 record layer framing.
//!
//! ```text
//! struct {
//!     ContentType type;
//!     ProtocolVersion version;     // 0x0303 once negotiated
//!     uint16 length;
//!     opaque fragment[length];
//! } TLSPlaintext / TLSCiphertext;
//! ```
//!
//! Protection of the fragment lives in [`crate::record_protection`].

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ContentType, ProtocolVersion};

/// Maximum plaintext fragment size (2^14).
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// Maximum protected fragment size (2^14 + 2048).
pub const MAX_CIPHERTEXT_SIZE: usize = MAX_FRAGMENT_SIZE + 2048;

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Parsed record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Content type
    pub content_type: ContentType,

    /// Record-layer version as sent by the peer
    pub version: u16,

    /// Fragment length
    pub length: usize,
}

impl RecordHeader {
    /// Parse and validate a 5-byte record header.
    ///
    /// Any `3.x` record version is accepted here: clients commonly send
    /// their first ClientHello with a `3.1` record version, and version
    /// agreement is enforced by the handshake, not the framing.
    pub fn parse(header: &[u8; RECORD_HEADER_SIZE]) -> Result<Self> {
        let content_type = ContentType::from_u8(header[0]).ok_or_else(|| {
            Error::UnexpectedMessage(format!("Unknown record content type {}", header[0]))
        })?;

        let version = u16::from_be_bytes([header[1], header[2]]);
        if version >> 8 != 0x03 {
            return Err(Error::ProtocolError(ProtocolError::DecodeError));
        }

        let length = u16::from_be_bytes([header[3], header[4]]) as usize;
        if length > MAX_CIPHERTEXT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        Ok(Self {
            content_type,
            version,
            length,
        })
    }
}

/// TLS record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPlaintext {
    /// Content type
    pub content_type: ContentType,

    /// Record-layer version
    pub version: u16,

    /// Fragment data (plaintext, or ciphertext once protection is active)
    pub fragment: Vec<u8>,
}

impl TlsPlaintext {
    /// Create a new TLS 1.2 record.
    pub fn new(content_type: ContentType, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            version: ProtocolVersion::Tls12.to_u16(),
            fragment,
        }
    }

    /// Get the record length (including header).
    pub fn len(&self) -> usize {
        RECORD_HEADER_SIZE + self.fragment.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Encode the record to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.fragment.len() > MAX_CIPHERTEXT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        let mut buf = Vec::with_capacity(self.len());
        buf.push(self.content_type.to_u8());
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&(self.fragment.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.fragment);
        Ok(buf)
    }

    /// Decode one record from the front of `data`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::InvalidMessage("Record too short".into()));
        }

        let mut header_bytes = [0u8; RECORD_HEADER_SIZE];
        header_bytes.copy_from_slice(&data[..RECORD_HEADER_SIZE]);
        let header = RecordHeader::parse(&header_bytes)?;

        let end = RECORD_HEADER_SIZE + header.length;
        if data.len() < end {
            return Err(Error::InvalidMessage("Incomplete record".into()));
        }

        Ok((
            Self {
                content_type: header.content_type,
                version: header.version,
                fragment: data[RECORD_HEADER_SIZE..end].to_vec(),
            },
            end,
        ))
    }
}

/// Splits outgoing payloads into records no larger than the fragment limit.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayer {
    max_fragment_length: usize,
}

impl RecordLayer {
    /// Create a record layer with the given fragment limit (capped at 2^14).
    pub fn new(max_fragment_length: u16) -> Self {
        Self {
            max_fragment_length: (max_fragment_length as usize).clamp(1, MAX_FRAGMENT_SIZE),
        }
    }

    /// Current fragment limit.
    pub fn max_fragment_length(&self) -> usize {
        self.max_fragment_length
    }

    /// Fragment a payload into records.
    ///
    /// Empty payloads yield no records; zero-length handshake, alert and
    /// change_cipher_spec fragments are not allowed in TLS 1.2.
    pub fn fragment(&self, content_type: ContentType, data: &[u8]) -> Vec<TlsPlaintext> {
        fragment_payload(content_type, data, self.max_fragment_length)
    }
}

/// Split `data` into records of at most `max` bytes (capped at 2^14).
pub fn fragment_payload(content_type: ContentType, data: &[u8], max: usize) -> Vec<TlsPlaintext> {
    data.chunks(max.clamp(1, MAX_FRAGMENT_SIZE))
        .map(|chunk| TlsPlaintext::new(content_type, chunk.to_vec()))
        .collect()
}

impl Default for RecordLayer {
    fn default() -> Self {
        Self::new(MAX_FRAGMENT_SIZE as u16)
    }
}
