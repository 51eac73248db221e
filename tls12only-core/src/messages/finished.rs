//! Finished message (RFC 5246 Section 7.4.9).

use crate::error::{Error, Result};
use subtle::ConstantTimeEq;

/// Length of `verify_data` for every TLS 1.2 suite this engine supports.
pub const VERIFY_DATA_LENGTH: usize = 12;

/// Finished message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// PRF(master_secret, finished_label, Hash(handshake_messages))[0..12]
    pub verify_data: [u8; VERIFY_DATA_LENGTH],
}

impl Finished {
    /// Create a Finished message.
    pub fn new(verify_data: [u8; VERIFY_DATA_LENGTH]) -> Self {
        Self { verify_data }
    }

    /// Encode the body.
    pub fn encode(&self) -> Vec<u8> {
        self.verify_data.to_vec()
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let verify_data: [u8; VERIFY_DATA_LENGTH] = data.try_into().map_err(|_| {
            Error::InvalidMessage(format!(
                "Finished must be {} bytes, got {}",
                VERIFY_DATA_LENGTH,
                data.len()
            ))
        })?;
        Ok(Self::new(verify_data))
    }

    /// Constant-time comparison against the expected verify_data.
    pub fn matches(&self, expected: &[u8]) -> bool {
        self.verify_data[..].ct_eq(expected).into()
    }
}
