//! Blocking streams over loopback TCP.
//!
//! Covers a real client/server pair, raw-socket peers that only speak
//! TLS 1.3, and raw TLS 1.2 peers driven by the core state machines that
//! send what a well-behaved stream never would.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Once};
use std::thread;
use tls12only::tls12only_core::extensions::{
    supported_groups_extension, supported_versions_client_extension,
    supported_versions_server_extension, Extensions,
};
use tls12only::tls12only_core::handshake::{
    ClientHandshake, ClientHandshakeConfig, ServerHandshake, ServerHandshakeConfig,
    CHANGE_CIPHER_SPEC_PAYLOAD,
};
use tls12only::tls12only_core::handshake_io::{HandshakeMessage, HandshakeReassembler};
use tls12only::tls12only_core::messages::{ClientHello, ServerHello};
use tls12only::tls12only_core::protocol::HandshakeType;
use tls12only::tls12only_core::record::TlsPlaintext;
use tls12only::tls12only_core::record_protection::RecordProtection;
use tls12only::tls12only_crypto::{KeyExchangeAlgorithm, SigningKey};
use tls12only::{
    AlertDescription, CipherSuite, ClientConfig, ContentType, Error, PinnedCertificateVerifier,
    ProtocolError, ProtocolVersion, RustCryptoProvider, ServerConfig, TlsStream,
    VerificationResult,
};

const SERVER_CERT: &[u8] = include_bytes!("../../testdata/server.der");
const SERVER_KEY: &[u8] = include_bytes!("../../testdata/server.key");
const OTHER_CERT: &[u8] = include_bytes!("../../testdata/other.der");

/// Fatal protocol_version alert record, as a TLS 1.3-only peer sends it.
const PROTOCOL_VERSION_ALERT: [u8; 7] = [21, 0x03, 0x03, 0x00, 0x02, 2, 70];

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn server_config() -> ServerConfig {
    ServerConfig::builder()
        .with_certificate_chain(vec![SERVER_CERT.to_vec()])
        .with_private_key(SERVER_KEY.to_vec())
        .with_alpn_protocols(vec!["echo/1".to_string()])
        .build()
        .unwrap()
}

fn client_config() -> ClientConfig {
    ClientConfig::builder()
        .add_root_certificate(SERVER_CERT.to_vec())
        .with_alpn_protocols(vec!["echo/1".to_string()])
        .build()
        .unwrap()
}

fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Read one record off a raw socket.
fn read_raw_record(socket: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 5];
    socket.read_exact(&mut header).unwrap();
    let length = u16::from_be_bytes([header[3], header[4]]) as usize;
    let mut record = header.to_vec();
    record.resize(5 + length, 0);
    socket.read_exact(&mut record[5..]).unwrap();
    record
}

fn handshake_record(msg_type: HandshakeType, body: Vec<u8>) -> Vec<u8> {
    let message = HandshakeMessage::new(msg_type, body).encode().unwrap();
    TlsPlaintext::new(tls12only::ContentType::Handshake, message)
        .encode()
        .unwrap()
}

/// A TLS 1.2 endpoint assembled from the core state machines over a raw
/// socket, so tests can inject records after the handshake.
struct RawPeer {
    socket: TcpStream,
    provider: RustCryptoProvider,
    reassembler: HandshakeReassembler,
    read: Option<RecordProtection>,
    write: Option<RecordProtection>,
}

impl RawPeer {
    fn new(socket: TcpStream) -> Self {
        Self {
            socket,
            provider: RustCryptoProvider::default(),
            reassembler: HandshakeReassembler::new(),
            read: None,
            write: None,
        }
    }

    /// Complete a server-side handshake with the test certificate.
    fn accept(socket: TcpStream) -> Self {
        let mut peer = Self::new(socket);
        let provider = RustCryptoProvider::default();
        let mut handshake = ServerHandshake::new(ServerHandshakeConfig::new(
            vec![SERVER_CERT.to_vec()],
            SigningKey::from_bytes(SERVER_KEY.to_vec()),
        ));

        let client_hello = peer.recv_handshake();
        let flight = handshake
            .process_client_hello(&provider, &client_hello)
            .unwrap();
        peer.send(ContentType::Handshake, &flight.concat());

        let client_key_exchange = peer.recv_handshake();
        handshake
            .process_client_key_exchange(&provider, &client_key_exchange)
            .unwrap();
        let keys = handshake.key_material().unwrap();
        let (client_write, server_write) =
            (keys.client_write().unwrap(), keys.server_write().unwrap());

        let payload = peer.recv_change_cipher_spec();
        handshake.process_change_cipher_spec(&payload).unwrap();
        peer.read = Some(client_write);

        let finished = peer.recv_handshake();
        let server_finished = handshake
            .process_client_finished(&provider, &finished)
            .unwrap();
        peer.send(ContentType::ChangeCipherSpec, &CHANGE_CIPHER_SPEC_PAYLOAD);
        peer.write = Some(server_write);
        peer.send(ContentType::Handshake, &server_finished);
        peer
    }

    /// Complete a client-side handshake that pins the test certificate.
    fn connect(socket: TcpStream) -> Self {
        let mut peer = Self::new(socket);
        let provider = RustCryptoProvider::default();
        let mut handshake = ClientHandshake::new(ClientHandshakeConfig {
            server_name: Some("localhost".into()),
            verifier: Arc::new(PinnedCertificateVerifier::new(vec![SERVER_CERT.to_vec()])),
            ..Default::default()
        });

        let client_hello = handshake.client_hello(&provider).unwrap();
        peer.send(ContentType::Handshake, &client_hello);

        let flight = loop {
            let raw = peer.recv_handshake();
            match HandshakeMessage::decode(&raw).unwrap().msg_type {
                HandshakeType::ServerHello => handshake.process_server_hello(&raw).unwrap(),
                HandshakeType::Certificate => handshake.process_certificate(&raw).unwrap(),
                HandshakeType::ServerKeyExchange => handshake
                    .process_server_key_exchange(&provider, &raw)
                    .unwrap(),
                HandshakeType::ServerHelloDone => {
                    break handshake
                        .process_server_hello_done(&provider, &raw)
                        .unwrap();
                },
                other => panic!("unexpected server message {:?}", other),
            }
        };
        let keys = handshake.key_material().unwrap();
        let (client_write, server_write) =
            (keys.client_write().unwrap(), keys.server_write().unwrap());

        peer.send(ContentType::Handshake, &flight.messages.concat());
        peer.send(ContentType::ChangeCipherSpec, &CHANGE_CIPHER_SPEC_PAYLOAD);
        peer.write = Some(client_write);
        peer.send(ContentType::Handshake, &flight.finished);

        let payload = peer.recv_change_cipher_spec();
        handshake.process_change_cipher_spec(&payload).unwrap();
        peer.read = Some(server_write);

        let finished = peer.recv_handshake();
        handshake
            .process_server_finished(&provider, &finished)
            .unwrap();
        peer
    }

    fn send(&mut self, content_type: ContentType, payload: &[u8]) {
        let fragment = match self.write.as_mut() {
            Some(protection) => protection
                .encrypt(&self.provider, content_type, payload)
                .unwrap(),
            None => payload.to_vec(),
        };
        let record = TlsPlaintext::new(content_type, fragment).encode().unwrap();
        self.socket.write_all(&record).unwrap();
    }

    fn send_handshake_message(&mut self, msg_type: HandshakeType, body: Vec<u8>) {
        let message = HandshakeMessage::new(msg_type, body).encode().unwrap();
        self.send(ContentType::Handshake, &message);
    }

    fn recv(&mut self) -> (ContentType, Vec<u8>) {
        let record = read_raw_record(&mut self.socket);
        let content_type = ContentType::from_u8(record[0]).unwrap();
        let content = match self.read.as_mut() {
            Some(protection) => protection
                .decrypt(&self.provider, content_type, &record[5..])
                .unwrap(),
            None => record[5..].to_vec(),
        };
        (content_type, content)
    }

    fn recv_handshake(&mut self) -> Vec<u8> {
        loop {
            if let Some((_, raw)) = self.reassembler.next_message().unwrap() {
                return raw;
            }
            let (content_type, content) = self.recv();
            assert_eq!(content_type, ContentType::Handshake);
            self.reassembler.push(&content);
        }
    }

    fn recv_change_cipher_spec(&mut self) -> Vec<u8> {
        let (content_type, content) = self.recv();
        assert_eq!(content_type, ContentType::ChangeCipherSpec);
        content
    }
}

#[test]
fn test_handshake_and_echo() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut tls = TlsStream::accept(server_config(), tcp).unwrap();
        assert_eq!(tls.server_name(), Some("localhost"));
        assert_eq!(tls.alpn_protocol(), Some(&b"echo/1"[..]));

        // Echo until close_notify
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = tls.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            tls.write_all(&buf[..n]).unwrap();
            received.extend_from_slice(&buf[..n]);
        }
        tls.close().unwrap();
        received
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();

    assert_eq!(tls.protocol_version(), Some(ProtocolVersion::Tls12));
    assert_eq!(
        tls.negotiated_cipher_suite(),
        Some(CipherSuite::EcdheEcdsaWithAes128GcmSha256)
    );
    assert_eq!(tls.alpn_protocol(), Some(&b"echo/1"[..]));
    assert_eq!(tls.server_name(), Some("localhost"));
    assert_eq!(tls.peer_certificates(), &[SERVER_CERT.to_vec()][..]);
    assert_eq!(tls.verification_result(), Some(&VerificationResult::Verified));
    assert!(tls.extended_master_secret());

    let message = b"hello over TLS 1.2";
    tls.write_all(message).unwrap();
    let mut echoed = vec![0u8; message.len()];
    tls.read_exact(&mut echoed).unwrap();
    assert_eq!(&echoed, message);

    tls.close().unwrap();
    let mut rest = Vec::new();
    tls.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    assert_eq!(server.join().unwrap(), message);
}

#[test]
fn test_large_transfer_every_suite() {
    init_tracing();

    for suite in [
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        CipherSuite::EcdheEcdsaWithAes256GcmSha384,
        CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256,
    ] {
        let (listener, addr) = listen();
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
        let expected = payload.clone();

        let server = thread::spawn(move || {
            let (tcp, _) = listener.accept().unwrap();
            let mut tls = TlsStream::accept(server_config(), tcp).unwrap();
            let mut received = Vec::new();
            tls.read_to_end(&mut received).unwrap();
            received
        });

        let config = ClientConfig::builder()
            .add_root_certificate(SERVER_CERT.to_vec())
            .with_cipher_suites(&[suite])
            .with_groups(&[KeyExchangeAlgorithm::Secp256r1])
            .build()
            .unwrap();
        let tcp = TcpStream::connect(&addr).unwrap();
        let mut tls = TlsStream::connect(config, "localhost", tcp).unwrap();
        assert_eq!(tls.negotiated_cipher_suite(), Some(suite));

        tls.write_all(&payload).unwrap();
        tls.close().unwrap();

        assert_eq!(server.join().unwrap(), expected, "{}", suite);
    }
}

#[test]
fn test_client_against_tls13_only_server_alert() {
    init_tracing();
    let (listener, addr) = listen();

    // Refuses the TLS 1.2 ClientHello the way a TLS 1.3-only server does
    let server = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let record = read_raw_record(&mut socket);
        socket.write_all(&PROTOCOL_VERSION_ALERT).unwrap();
        record
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let result = TlsStream::connect(client_config(), "localhost", tcp);

    let error = result.unwrap_err();
    assert_eq!(error, Error::AlertReceived(AlertDescription::ProtocolVersion));
    assert!(error.is_version_mismatch());

    // What the server saw: a TLS 1.2 ClientHello without supported_versions
    let record = server.join().unwrap();
    assert_eq!(record[0], 22);
    let message = HandshakeMessage::decode(&record[5..]).unwrap();
    let hello = ClientHello::decode(&message.payload).unwrap();
    assert_eq!(hello.client_version, 0x0303);
    assert!(hello
        .extensions
        .get(tls12only::protocol::ExtensionType::SupportedVersions)
        .is_none());
}

#[test]
fn test_client_against_tls13_server_hello() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        read_raw_record(&mut socket);

        let mut extensions = Extensions::new();
        extensions.add(supported_versions_server_extension(0x0304));
        let mut hello = ServerHello::new([0x55; 32], CipherSuite::EcdheEcdsaWithAes128GcmSha256)
            .with_extensions(extensions)
            .with_session_id(vec![0x11; 32]);
        hello.cipher_suite = 0x1301;
        socket
            .write_all(&handshake_record(
                HandshakeType::ServerHello,
                hello.encode().unwrap(),
            ))
            .unwrap();

        read_raw_record(&mut socket)
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let result = TlsStream::connect(client_config(), "localhost", tcp);
    assert_eq!(
        result.unwrap_err(),
        Error::ProtocolError(ProtocolError::ProtocolVersion)
    );

    // The client told the server why
    assert_eq!(server.join().unwrap(), PROTOCOL_VERSION_ALERT);
}

#[test]
fn test_server_against_tls13_only_client() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        TlsStream::accept(server_config(), tcp).map(|_| ())
    });

    let mut extensions = Extensions::new();
    extensions.add(supported_versions_client_extension(&[0x0304]));
    extensions.add(supported_groups_extension(&[KeyExchangeAlgorithm::X25519]));
    let mut hello = ClientHello::new([0x77; 32], &[]).with_extensions(extensions);
    hello.cipher_suites = vec![0x1301, 0x1302, 0x1303];

    let mut socket = TcpStream::connect(&addr).unwrap();
    socket
        .write_all(&handshake_record(
            HandshakeType::ClientHello,
            hello.encode().unwrap(),
        ))
        .unwrap();

    assert_eq!(read_raw_record(&mut socket), PROTOCOL_VERSION_ALERT);
    assert_eq!(
        server.join().unwrap(),
        Err(Error::ProtocolError(ProtocolError::ProtocolVersion))
    );
}

#[test]
fn test_unpinned_server_certificate() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        TlsStream::accept(server_config(), tcp).map(|_| ())
    });

    let config = ClientConfig::builder()
        .add_root_certificate(OTHER_CERT.to_vec())
        .build()
        .unwrap();
    let tcp = TcpStream::connect(&addr).unwrap();
    let result = TlsStream::connect(config, "localhost", tcp);

    assert!(matches!(result, Err(Error::CertificateVerificationFailed(_))));
    assert_eq!(
        server.join().unwrap(),
        Err(Error::AlertReceived(AlertDescription::BadCertificate))
    );
}

#[test]
fn test_truncation_is_not_eof() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut tls = TlsStream::accept(server_config(), tcp).unwrap();
        tls.write_all(b"partial").unwrap();
        // Drop the transport without close_notify
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();
    server.join().unwrap();

    let mut buf = [0u8; 7];
    tls.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"partial");

    let error = tls.read(&mut buf).unwrap_err();
    assert_eq!(error.kind(), std::io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_write_after_close_fails() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut tls = TlsStream::accept(server_config(), tcp).unwrap();
        let mut buf = Vec::new();
        tls.read_to_end(&mut buf).unwrap();
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();
    tls.close().unwrap();
    assert!(tls.write(b"late").is_err());

    server.join().unwrap();
}

#[test]
fn test_client_reports_any_fatal_alert() {
    init_tracing();

    // Registered after RFC 5246, reserved, and unassigned descriptions
    for description in [30u8, 60, 113, 116, 200] {
        let (listener, addr) = listen();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            read_raw_record(&mut socket);
            socket
                .write_all(&[21, 0x03, 0x03, 0x00, 0x02, 2, description])
                .unwrap();

            let mut answer = Vec::new();
            socket.read_to_end(&mut answer).unwrap();
            answer
        });

        let tcp = TcpStream::connect(&addr).unwrap();
        let result = TlsStream::connect(client_config(), "localhost", tcp);
        assert_eq!(
            result.unwrap_err(),
            Error::AlertReceived(AlertDescription::from_u8(description))
        );

        // A fatal alert is never answered
        assert!(server.join().unwrap().is_empty(), "alert {}", description);
    }
}

#[test]
fn test_client_reads_coalesced_alerts() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        read_raw_record(&mut socket);
        // user_canceled warning followed by a fatal handshake_failure
        socket
            .write_all(&[21, 0x03, 0x03, 0x00, 0x04, 1, 90, 2, 40])
            .unwrap();
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let result = TlsStream::connect(client_config(), "localhost", tcp);
    assert_eq!(
        result.unwrap_err(),
        Error::AlertReceived(AlertDescription::HandshakeFailure)
    );
    server.join().unwrap();
}

#[test]
fn test_client_refuses_hello_request() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut peer = RawPeer::accept(tcp);

        peer.send_handshake_message(HandshakeType::HelloRequest, Vec::new());
        peer.send(ContentType::ApplicationData, b"after hello_request");

        let refusal = peer.recv();
        let reply = peer.recv();
        (refusal, reply)
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();

    let mut buf = [0u8; 19];
    tls.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"after hello_request");
    tls.write_all(b"still connected").unwrap();

    let (refusal, reply) = server.join().unwrap();
    assert_eq!(refusal, (ContentType::Alert, vec![1, 100]));
    assert_eq!(
        reply,
        (ContentType::ApplicationData, b"still connected".to_vec())
    );
}

#[test]
fn test_server_refuses_client_renegotiation() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut tls = TlsStream::accept(server_config(), tcp).unwrap();
        let mut buf = [0u8; 4];
        tls.read_exact(&mut buf).unwrap();
        tls.write_all(b"pong").unwrap();
        buf
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut peer = RawPeer::connect(tcp);

    let hello = ClientHello::new([0x33; 32], &[CipherSuite::EcdheEcdsaWithAes128GcmSha256]);
    peer.send_handshake_message(HandshakeType::ClientHello, hello.encode().unwrap());
    peer.send(ContentType::ApplicationData, b"ping");

    assert_eq!(peer.recv(), (ContentType::Alert, vec![1, 100]));
    assert_eq!(peer.recv(), (ContentType::ApplicationData, b"pong".to_vec()));
    assert_eq!(&server.join().unwrap(), b"ping");
}

#[test]
fn test_unexpected_post_handshake_message() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut peer = RawPeer::accept(tcp);
        peer.send_handshake_message(HandshakeType::ServerHelloDone, Vec::new());
        peer.recv()
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();

    let mut buf = [0u8; 16];
    let error = tls.read(&mut buf).unwrap_err();
    assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    assert!(tls.write(b"late").is_err());

    assert_eq!(server.join().unwrap(), (ContentType::Alert, vec![2, 10]));
}

#[test]
fn test_change_cipher_spec_after_handshake() {
    init_tracing();
    let (listener, addr) = listen();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut peer = RawPeer::accept(tcp);
        peer.send(ContentType::ChangeCipherSpec, &CHANGE_CIPHER_SPEC_PAYLOAD);
        peer.recv()
    });

    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(client_config(), "localhost", tcp).unwrap();

    let mut buf = [0u8; 16];
    assert!(tls.read(&mut buf).is_err());
    assert_eq!(server.join().unwrap(), (ContentType::Alert, vec![2, 10]));
}

#[test]
fn test_max_fragment_length_caps_records() {
    init_tracing();
    let (listener, addr) = listen();
    let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();

    let server = thread::spawn(move || {
        let (tcp, _) = listener.accept().unwrap();
        let mut peer = RawPeer::accept(tcp);

        let mut sizes = Vec::new();
        let mut received = Vec::new();
        while received.len() < 2000 {
            let (content_type, content) = peer.recv();
            assert_eq!(content_type, ContentType::ApplicationData);
            sizes.push(content.len());
            received.extend_from_slice(&content);
        }
        (sizes, received)
    });

    let config = ClientConfig::builder()
        .add_root_certificate(SERVER_CERT.to_vec())
        .with_max_fragment_length(512)
        .build()
        .unwrap();
    let tcp = TcpStream::connect(&addr).unwrap();
    let mut tls = TlsStream::connect(config, "localhost", tcp).unwrap();
    tls.write_all(&payload).unwrap();

    let (sizes, received) = server.join().unwrap();
    assert_eq!(sizes, vec![512, 512, 512, 464]);
    assert_eq!(received, payload);
}
