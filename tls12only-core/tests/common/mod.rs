//! Shared fixtures for the handshake integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use tls12only_core::certificate::PinnedCertificateVerifier;
use tls12only_core::handshake::{
    ClientHandshake, ClientHandshakeConfig, ServerHandshake, ServerHandshakeConfig,
};
use tls12only_core::handshake::CHANGE_CIPHER_SPEC_PAYLOAD;
use tls12only_core::handshake_io::HandshakeMessage;
use tls12only_core::protocol::HandshakeType;
use tls12only_core::Result;
use tls12only_crypto::{CryptoProvider, SigningKey};
use tls12only_crypto_rustcrypto::RustCryptoProvider;

pub const SERVER_CERT: &[u8] = include_bytes!("../../../testdata/server.der");
pub const SERVER_KEY: &[u8] = include_bytes!("../../../testdata/server.key");
pub const OTHER_CERT: &[u8] = include_bytes!("../../../testdata/other.der");

pub fn provider() -> RustCryptoProvider {
    RustCryptoProvider::new()
}

pub fn server_config() -> ServerHandshakeConfig {
    ServerHandshakeConfig::new(
        vec![SERVER_CERT.to_vec()],
        SigningKey::from_bytes(SERVER_KEY.to_vec()),
    )
}

/// Client parameters that trust the test server certificate.
pub fn client_config() -> ClientHandshakeConfig {
    ClientHandshakeConfig {
        server_name: Some("localhost".into()),
        verifier: Arc::new(PinnedCertificateVerifier::new(vec![SERVER_CERT.to_vec()])),
        ..Default::default()
    }
}

pub fn message_type(raw: &[u8]) -> HandshakeType {
    HandshakeMessage::decode(raw).unwrap().msg_type
}

/// Run a full handshake in memory.
///
/// Records are not framed here; the flights are handed over message by
/// message, with ChangeCipherSpec delivered as its one-byte payload.
pub fn run_handshake(
    provider: &dyn CryptoProvider,
    client: &mut ClientHandshake,
    server: &mut ServerHandshake,
) -> Result<()> {
    let client_hello = client.client_hello(provider)?;
    let flight = server.process_client_hello(provider, &client_hello)?;

    let mut client_flight = None;
    for message in &flight {
        match message_type(message) {
            HandshakeType::ServerHello => client.process_server_hello(message)?,
            HandshakeType::Certificate => client.process_certificate(message)?,
            HandshakeType::ServerKeyExchange => {
                client.process_server_key_exchange(provider, message)?
            },
            HandshakeType::CertificateRequest => client.process_certificate_request(message)?,
            HandshakeType::ServerHelloDone => {
                client_flight = Some(client.process_server_hello_done(provider, message)?)
            },
            other => panic!("unexpected server message {:?}", other),
        }
    }
    let client_flight = client_flight.expect("server flight ends with ServerHelloDone");

    for message in &client_flight.messages {
        server.process_client_key_exchange(provider, message)?;
    }
    server.process_change_cipher_spec(&CHANGE_CIPHER_SPEC_PAYLOAD)?;
    let server_finished = server.process_client_finished(provider, &client_flight.finished)?;

    client.process_change_cipher_spec(&CHANGE_CIPHER_SPEC_PAYLOAD)?;
    client.process_server_finished(provider, &server_finished)?;
    Ok(())
}
