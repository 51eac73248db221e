//! TLS 1.2 handshake state machines.
//!
//! Both sides take complete handshake messages (4-byte header included,
//! exactly as reassembled from the wire) and return the messages to send.
//! Record framing, ChangeCipherSpec records and the switch to protected
//! records are left to the caller: the state machines expose the derived
//! [`KeyMaterial`] once it exists.

pub mod client;
pub mod server;

pub use client::{ClientFinishedFlight, ClientHandshake, ClientHandshakeConfig, ClientState};
pub use server::{ServerHandshake, ServerHandshakeConfig, ServerState};

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, ProtocolError, Result};
use crate::handshake_io::HandshakeMessage;
use crate::prf::{compute_extended_master_secret, compute_key_block, compute_master_secret};
use crate::protocol::HandshakeType;
use crate::record_protection::KeyMaterial;
use crate::transcript::HandshakeTranscript;
use tls12only_crypto::CryptoProvider;
use zeroize::Zeroizing;

/// The single-byte ChangeCipherSpec payload.
pub const CHANGE_CIPHER_SPEC_PAYLOAD: [u8; 1] = [1];

/// Validate a received ChangeCipherSpec payload.
pub fn check_change_cipher_spec(payload: &[u8]) -> Result<()> {
    if payload == CHANGE_CIPHER_SPEC_PAYLOAD {
        Ok(())
    } else {
        Err(Error::ProtocolError(ProtocolError::DecodeError))
    }
}

/// Decode `raw` and require it to be of `expected` type.
pub(crate) fn expect_message(raw: &[u8], expected: HandshakeType) -> Result<HandshakeMessage> {
    let message = HandshakeMessage::decode(raw)?;
    if message.msg_type != expected {
        return Err(Error::UnexpectedMessage(format!(
            "Expected {:?}, got {:?}",
            expected, message.msg_type
        )));
    }
    Ok(message)
}

/// Wrap a message body in a handshake header.
pub(crate) fn encode_handshake(msg_type: HandshakeType, body: Vec<u8>) -> Result<Vec<u8>> {
    HandshakeMessage::new(msg_type, body).encode()
}

/// Derive the master secret and traffic keys once ClientKeyExchange is in
/// the transcript.
pub(crate) fn derive_secrets(
    provider: &dyn CryptoProvider,
    suite: CipherSuite,
    premaster_secret: &[u8],
    transcript: &HandshakeTranscript,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    extended_master_secret: bool,
) -> Result<(Zeroizing<Vec<u8>>, KeyMaterial)> {
    let hash = suite.hash_algorithm();

    let master_secret = if extended_master_secret {
        let session_hash = transcript.current_hash(provider, hash)?;
        compute_extended_master_secret(provider, hash, premaster_secret, &session_hash)?
    } else {
        compute_master_secret(provider, hash, premaster_secret, client_random, server_random)?
    };

    let key_block = compute_key_block(
        provider,
        hash,
        &master_secret,
        client_random,
        server_random,
        suite.key_block_length(),
    )?;
    let keys = KeyMaterial::from_key_block(&key_block, suite)?;

    Ok((master_secret, keys))
}
