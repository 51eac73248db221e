//! Shared fixtures for the tls12only benchmarks.

use std::sync::Arc;
use tls12only_core::certificate::PinnedCertificateVerifier;
use tls12only_core::handshake::{
    ClientHandshake, ClientHandshakeConfig, ServerHandshake, ServerHandshakeConfig,
    CHANGE_CIPHER_SPEC_PAYLOAD,
};
use tls12only_core::{CipherSuite, Result};
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm, SigningKey};

/// Test server certificate (P-256, CN=localhost).
pub const SERVER_CERT: &[u8] = include_bytes!("../../testdata/server.der");

/// Raw P-256 scalar for [`SERVER_CERT`].
pub const SERVER_KEY: &[u8] = include_bytes!("../../testdata/server.key");

/// Client parameters offering exactly `suite` and `group`.
pub fn client_config(suite: CipherSuite, group: KeyExchangeAlgorithm) -> ClientHandshakeConfig {
    ClientHandshakeConfig {
        cipher_suites: vec![suite],
        groups: vec![group],
        server_name: Some("localhost".into()),
        verifier: Arc::new(PinnedCertificateVerifier::new(vec![SERVER_CERT.to_vec()])),
        ..Default::default()
    }
}

/// Server parameters for the test certificate.
pub fn server_config() -> ServerHandshakeConfig {
    ServerHandshakeConfig::new(
        vec![SERVER_CERT.to_vec()],
        SigningKey::from_bytes(SERVER_KEY.to_vec()),
    )
}

/// Run a complete handshake in memory and return both connected ends.
pub fn full_handshake(
    provider: &dyn CryptoProvider,
    client_params: ClientHandshakeConfig,
) -> Result<(ClientHandshake, ServerHandshake)> {
    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());

    let client_hello = client.client_hello(provider)?;
    let flight = server.process_client_hello(provider, &client_hello)?;

    client.process_server_hello(&flight[0])?;
    client.process_certificate(&flight[1])?;
    client.process_server_key_exchange(provider, &flight[2])?;
    let client_flight = client.process_server_hello_done(provider, &flight[3])?;

    for message in &client_flight.messages {
        server.process_client_key_exchange(provider, message)?;
    }
    server.process_change_cipher_spec(&CHANGE_CIPHER_SPEC_PAYLOAD)?;
    let server_finished = server.process_client_finished(provider, &client_flight.finished)?;

    client.process_change_cipher_spec(&CHANGE_CIPHER_SPEC_PAYLOAD)?;
    client.process_server_finished(provider, &server_finished)?;

    Ok((client, server))
}
