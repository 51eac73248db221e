//! ServerHelloDone message (RFC 5246 Section 7.4.5).

use crate::error::{Error, Result};

/// ServerHelloDone has an empty body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerHelloDone;

impl ServerHelloDone {
    /// Encode the (empty) body.
    pub fn encode(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Decode the body; anything other than zero bytes is malformed.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if !data.is_empty() {
            return Err(Error::InvalidMessage(
                "ServerHelloDone must be empty".into(),
            ));
        }
        Ok(Self)
    }
}
