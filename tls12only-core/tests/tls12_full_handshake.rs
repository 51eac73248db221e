//! TLS 1.2 handshake integration tests.
//!
//! Drives [`ClientHandshake`] against [`ServerHandshake`] in memory with a
//! real P-256 certificate, then checks both sides derived the same traffic
//! keys by exchanging protected records.

mod common;

use common::{client_config, provider, run_handshake, server_config, OTHER_CERT, SERVER_CERT};
use std::sync::Arc;
use tls12only_core::certificate::{AuthMode, PinnedCertificateVerifier, VerificationResult};
use tls12only_core::handshake::{ClientHandshake, ClientState, ServerHandshake, ServerState};
use tls12only_core::protocol::ContentType;
use tls12only_core::{CipherSuite, Error, ProtocolError, ProtocolVersion};
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm};

fn assert_keys_agree(
    provider: &dyn CryptoProvider,
    client: &ClientHandshake,
    server: &ServerHandshake,
) {
    let client_keys = client.key_material().expect("client keys");
    let server_keys = server.key_material().expect("server keys");

    let mut client_out = client_keys.client_write().unwrap();
    let mut server_in = server_keys.client_write().unwrap();
    let record = client_out
        .encrypt(provider, ContentType::ApplicationData, b"GET / HTTP/1.1\r\n\r\n")
        .unwrap();
    assert_eq!(
        server_in
            .decrypt(provider, ContentType::ApplicationData, &record)
            .unwrap(),
        b"GET / HTTP/1.1\r\n\r\n"
    );

    let mut server_out = server_keys.server_write().unwrap();
    let mut client_in = client_keys.server_write().unwrap();
    let record = server_out
        .encrypt(provider, ContentType::ApplicationData, b"HTTP/1.1 200 OK\r\n\r\n")
        .unwrap();
    assert_eq!(
        client_in
            .decrypt(provider, ContentType::ApplicationData, &record)
            .unwrap(),
        b"HTTP/1.1 200 OK\r\n\r\n"
    );
}

#[test]
fn test_handshake_default_parameters() {
    let provider = provider();
    let mut client = ClientHandshake::new(client_config());
    let mut server = ServerHandshake::new(server_config());

    run_handshake(&provider, &mut client, &mut server).expect("handshake");

    assert_eq!(client.state(), ClientState::Connected);
    assert_eq!(server.state(), ServerState::Connected);
    assert_eq!(client.protocol_version(), Some(ProtocolVersion::Tls12));
    assert_eq!(server.protocol_version(), Some(ProtocolVersion::Tls12));
    assert_eq!(client.cipher_suite(), server.cipher_suite());
    assert!(client.extended_master_secret());
    assert!(server.extended_master_secret());
    assert!(client.secure_renegotiation());
    assert_eq!(client.verification_result(), Some(&VerificationResult::Verified));
    assert_eq!(client.peer_certificates(), &[SERVER_CERT.to_vec()][..]);
    assert_eq!(server.server_name(), Some("localhost"));

    assert_keys_agree(&provider, &client, &server);
}

#[test]
fn test_handshake_every_cipher_suite() {
    let provider = provider();

    for suite in [
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        CipherSuite::EcdheEcdsaWithAes256GcmSha384,
        CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256,
    ] {
        let mut client_params = client_config();
        client_params.cipher_suites = vec![suite];
        let mut client = ClientHandshake::new(client_params);
        let mut server = ServerHandshake::new(server_config());

        run_handshake(&provider, &mut client, &mut server)
            .unwrap_or_else(|e| panic!("{} failed: {}", suite, e));

        assert_eq!(client.cipher_suite(), Some(suite));
        assert_eq!(server.cipher_suite(), Some(suite));
        assert_keys_agree(&provider, &client, &server);
    }
}

#[test]
fn test_handshake_every_group() {
    let provider = provider();

    for group in [KeyExchangeAlgorithm::X25519, KeyExchangeAlgorithm::Secp256r1] {
        let mut client_params = client_config();
        client_params.groups = vec![group];
        let mut client = ClientHandshake::new(client_params);
        let mut server = ServerHandshake::new(server_config());

        run_handshake(&provider, &mut client, &mut server)
            .unwrap_or_else(|e| panic!("{} failed: {}", group.name(), e));
        assert_keys_agree(&provider, &client, &server);
    }
}

#[test]
fn test_server_cipher_suite_preference() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.cipher_suites = vec![
        CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256,
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
    ];
    let mut server_params = server_config();
    server_params.cipher_suites = vec![
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256,
    ];

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_params);
    run_handshake(&provider, &mut client, &mut server).unwrap();

    assert_eq!(
        client.cipher_suite(),
        Some(CipherSuite::EcdheEcdsaWithAes128GcmSha256)
    );
}

#[test]
fn test_no_shared_cipher_suite() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.cipher_suites = vec![CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256];
    let mut server_params = server_config();
    server_params.cipher_suites = vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256];

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_params);
    let result = run_handshake(&provider, &mut client, &mut server);

    assert_eq!(
        result,
        Err(Error::ProtocolError(ProtocolError::HandshakeFailure))
    );
    assert_eq!(server.state(), ServerState::Failed);
}

#[test]
fn test_alpn_selection() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    let mut server_params = server_config();
    server_params.alpn_protocols = vec![b"http/1.1".to_vec(), b"h2".to_vec()];

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_params);
    run_handshake(&provider, &mut client, &mut server).unwrap();

    assert_eq!(client.alpn_protocol(), Some(&b"http/1.1"[..]));
    assert_eq!(server.alpn_protocol(), Some(&b"http/1.1"[..]));
}

#[test]
fn test_alpn_no_overlap() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.alpn_protocols = vec![b"h2".to_vec()];
    let mut server_params = server_config();
    server_params.alpn_protocols = vec![b"http/1.1".to_vec()];

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_params);
    let result = run_handshake(&provider, &mut client, &mut server);

    assert_eq!(
        result,
        Err(Error::ProtocolError(ProtocolError::NoApplicationProtocol))
    );
}

#[test]
fn test_server_without_alpn_ignores_offer() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.alpn_protocols = vec![b"h2".to_vec()];

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());
    run_handshake(&provider, &mut client, &mut server).unwrap();

    assert_eq!(client.alpn_protocol(), None);
}

#[test]
fn test_ip_literal_not_sent_as_server_name() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.server_name = Some("127.0.0.1".into());
    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());
    run_handshake(&provider, &mut client, &mut server).unwrap();

    assert_eq!(server.server_name(), None);
    assert_eq!(client.server_name(), Some("127.0.0.1"));
}

#[test]
fn test_unpinned_certificate_rejected() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.verifier = Arc::new(PinnedCertificateVerifier::new(vec![OTHER_CERT.to_vec()]));
    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());

    let result = run_handshake(&provider, &mut client, &mut server);
    assert!(matches!(result, Err(Error::CertificateVerificationFailed(_))));
    assert_eq!(client.state(), ClientState::Failed);
}

#[test]
fn test_optional_auth_mode_records_failure() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.verifier = Arc::new(PinnedCertificateVerifier::new(vec![OTHER_CERT.to_vec()]));
    client_params.auth_mode = AuthMode::Optional;
    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());

    run_handshake(&provider, &mut client, &mut server).unwrap();
    assert!(matches!(
        client.verification_result(),
        Some(VerificationResult::Failed(_))
    ));
}

#[test]
fn test_auth_mode_none_skips_verification() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.verifier = Arc::new(PinnedCertificateVerifier::default());
    client_params.auth_mode = AuthMode::None;
    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_config());

    run_handshake(&provider, &mut client, &mut server).unwrap();
    assert_eq!(client.verification_result(), Some(&VerificationResult::Skipped));
}

#[test]
fn test_server_key_exchange_signature_checked() {
    let provider = provider();
    let mut client = ClientHandshake::new(client_config());
    let mut server = ServerHandshake::new(server_config());

    let client_hello = client.client_hello(&provider).unwrap();
    let flight = server.process_client_hello(&provider, &client_hello).unwrap();
    client.process_server_hello(&flight[0]).unwrap();
    client.process_certificate(&flight[1]).unwrap();

    // Flip a bit in the ephemeral public key
    let mut ske = flight[2].clone();
    ske[10] ^= 0x01;
    let result = client.process_server_key_exchange(&provider, &ske);

    assert_eq!(result, Err(Error::ProtocolError(ProtocolError::DecryptError)));
    assert_eq!(client.state(), ClientState::Failed);
}

#[test]
fn test_tampered_finished_rejected() {
    let provider = provider();
    let mut client = ClientHandshake::new(client_config());
    let mut server = ServerHandshake::new(server_config());

    let client_hello = client.client_hello(&provider).unwrap();
    let flight = server.process_client_hello(&provider, &client_hello).unwrap();
    client.process_server_hello(&flight[0]).unwrap();
    client.process_certificate(&flight[1]).unwrap();
    client.process_server_key_exchange(&provider, &flight[2]).unwrap();
    let client_flight = client.process_server_hello_done(&provider, &flight[3]).unwrap();

    server
        .process_client_key_exchange(&provider, &client_flight.messages[0])
        .unwrap();
    server.process_change_cipher_spec(&[1]).unwrap();

    let mut finished = client_flight.finished.clone();
    let last = finished.len() - 1;
    finished[last] ^= 0xFF;
    let result = server.process_client_finished(&provider, &finished);

    assert_eq!(result, Err(Error::ProtocolError(ProtocolError::DecryptError)));
    assert_eq!(server.state(), ServerState::Failed);
}

#[test]
fn test_out_of_order_message() {
    let provider = provider();
    let mut client = ClientHandshake::new(client_config());
    let mut server = ServerHandshake::new(server_config());

    let client_hello = client.client_hello(&provider).unwrap();
    let flight = server.process_client_hello(&provider, &client_hello).unwrap();

    // Certificate before ServerHello
    let result = client.process_certificate(&flight[1]);
    assert!(matches!(result, Err(Error::UnexpectedMessage(_))));
    assert_eq!(client.state(), ClientState::Failed);

    // Nothing is accepted after a failure
    assert!(client.process_server_hello(&flight[0]).is_err());
}

#[test]
fn test_change_cipher_spec_before_key_exchange() {
    let provider = provider();
    let mut client = ClientHandshake::new(client_config());
    let mut server = ServerHandshake::new(server_config());

    let client_hello = client.client_hello(&provider).unwrap();
    server.process_client_hello(&provider, &client_hello).unwrap();

    let result = server.process_change_cipher_spec(&[1]);
    assert!(matches!(result, Err(Error::UnexpectedMessage(_))));
}

#[test]
fn test_required_extended_master_secret() {
    let provider = provider();

    let mut client_params = client_config();
    client_params.require_extended_master_secret = true;
    let mut server_params = server_config();
    server_params.require_extended_master_secret = true;

    let mut client = ClientHandshake::new(client_params);
    let mut server = ServerHandshake::new(server_params);
    run_handshake(&provider, &mut client, &mut server).unwrap();
    assert!(client.extended_master_secret());
}
