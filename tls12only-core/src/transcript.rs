//! Handshake transcript.
//!
//! Every handshake message except HelloRequest is recorded with its
//! 4-byte header. The hash is only known once the suite is negotiated, so
//! messages are buffered and hashed on demand.

use crate::error::Result;
use tls12only_crypto::{CryptoProvider, HashAlgorithm};

/// Buffered handshake transcript.
#[derive(Debug, Clone, Default)]
pub struct HandshakeTranscript {
    messages: Vec<u8>,
}

impl HandshakeTranscript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an encoded handshake message (header included).
    pub fn update(&mut self, message: &[u8]) {
        self.messages.extend_from_slice(message);
    }

    /// Hash of every message recorded so far.
    pub fn current_hash(
        &self,
        provider: &dyn CryptoProvider,
        algorithm: HashAlgorithm,
    ) -> Result<Vec<u8>> {
        Ok(provider.digest(algorithm, &self.messages)?)
    }

    /// Total bytes recorded.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tls12only_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_transcript_hash() {
        let provider = RustCryptoProvider::new();
        let mut transcript = HandshakeTranscript::new();
        assert!(transcript.is_empty());

        transcript.update(b"ab");
        let partial = transcript.current_hash(&provider, HashAlgorithm::Sha256).unwrap();
        transcript.update(b"c");
        let full = transcript.current_hash(&provider, HashAlgorithm::Sha256).unwrap();

        assert_ne!(partial, full);
        assert_eq!(
            hex::encode(full),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            transcript
                .current_hash(&provider, HashAlgorithm::Sha384)
                .unwrap()
                .len(),
            48
        );
    }
}
