//! ClientKeyExchange for ECDHE (RFC 8422 Section 5.7).

use super::{expect_end, read_vec_u8};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// ClientKeyExchange carrying the client's ephemeral ECDH point.
///
/// ```text
/// struct {
///     opaque point <1..2^8-1>;
/// } ClientECDiffieHellmanPublic;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyExchange {
    /// Client ephemeral public key
    pub public_key: Vec<u8>,
}

impl ClientKeyExchange {
    /// Create a ClientKeyExchange.
    pub fn new(public_key: Vec<u8>) -> Self {
        Self { public_key }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.public_key.is_empty() || self.public_key.len() > 255 {
            return Err(Error::InvalidMessage("Invalid ECDH public key length".into()));
        }
        let mut buf = BytesMut::with_capacity(1 + self.public_key.len());
        buf.put_u8(self.public_key.len() as u8);
        buf.put_slice(&self.public_key);
        Ok(buf.to_vec())
    }

    /// Decode the body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let public_key = read_vec_u8(&mut data, "ClientKeyExchange point")?;
        if public_key.is_empty() {
            return Err(Error::InvalidMessage("Empty ECDH public key".into()));
        }
        expect_end(data, "ClientKeyExchange")?;
        Ok(Self::new(public_key.to_vec()))
    }
}
