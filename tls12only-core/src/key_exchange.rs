//! Ephemeral ECDH for the ECDHE key exchange.
//!
//! 1. The server generates an ephemeral key pair and sends the public key,
//!    signed, in ServerKeyExchange.
//! 2. The client generates its own pair and sends the public key in
//!    ClientKeyExchange.
//! 3. Both sides compute the shared secret, which is the premaster secret.

use crate::error::{Error, Result};
use tls12only_crypto::key_exchange::PrivateKey;
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm};
use zeroize::Zeroizing;

/// An ephemeral key pair; the private half is wiped on drop.
#[derive(Debug)]
pub struct EphemeralKeyPair {
    /// Group the key belongs to
    pub group: KeyExchangeAlgorithm,
    /// Private key
    pub private_key: PrivateKey,
    /// Encoded public key (32 bytes for x25519, 65 for secp256r1)
    pub public_key: Vec<u8>,
}

/// Generate an ephemeral key pair for `group`.
pub fn generate_key_pair(
    provider: &dyn CryptoProvider,
    group: KeyExchangeAlgorithm,
) -> Result<EphemeralKeyPair> {
    let kex = provider
        .key_exchange(group)
        .map_err(|e| Error::CryptoError(format!("Failed to get key exchange: {}", e)))?;

    let (private_key, public_key) = kex.generate_keypair()?;

    Ok(EphemeralKeyPair {
        group,
        private_key,
        public_key: public_key.into_bytes(),
    })
}

/// Compute the premaster secret from our private key and the peer's point.
///
/// A malformed or low-order peer point fails with `illegal_parameter`.
pub fn compute_premaster_secret(
    provider: &dyn CryptoProvider,
    key_pair: &EphemeralKeyPair,
    peer_public_key: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if peer_public_key.len() != key_pair.group.public_key_size() {
        return Err(Error::ProtocolError(
            crate::error::ProtocolError::IllegalParameter,
        ));
    }

    let kex = provider
        .key_exchange(key_pair.group)
        .map_err(|e| Error::CryptoError(format!("Failed to get key exchange: {}", e)))?;

    let shared = kex.exchange(&key_pair.private_key, peer_public_key)?;
    Ok(Zeroizing::new(shared.as_bytes().to_vec()))
}
