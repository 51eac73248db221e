//! Blocking TLS stream.
//!
//! [`TlsStream`] runs the handshake to completion inside
//! [`TlsStream::connect`] / [`TlsStream::accept`] and then exposes the
//! connection through `std::io::Read` and `std::io::Write`.
//!
//! Record handling:
//!
//! - Handshake records are reassembled into messages before they reach the
//!   state machines, so messages may span or share records.
//! - Each direction switches to protected records at its ChangeCipherSpec.
//! - Any failure sends the matching fatal alert before the error is
//!   returned, and the stream refuses further use.
//! - Renegotiation is refused with a `no_renegotiation` warning.

use bytes::{Buf, BytesMut};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tls12only_core::alert::Alert;
use tls12only_core::certificate::VerificationResult;
use tls12only_core::handshake::{
    ClientHandshake, ClientState, ServerHandshake, ServerState, CHANGE_CIPHER_SPEC_PAYLOAD,
};
use tls12only_core::handshake_io::HandshakeReassembler;
use tls12only_core::protocol::{ContentType, HandshakeType};
use tls12only_core::record::{
    RecordHeader, RecordLayer, TlsPlaintext, MAX_FRAGMENT_SIZE, RECORD_HEADER_SIZE,
};
use tls12only_core::record_protection::{KeyMaterial, RecordProtection};
use tls12only_core::{AlertDescription, CipherSuite, Error, ProtocolError, ProtocolVersion, Result};
use tls12only_crypto::CryptoProvider;
use tracing::{debug, trace, warn};

use crate::{ClientConfig, ServerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Client,
    Server,
}

/// Parameters fixed by a completed handshake.
#[derive(Debug, Default)]
struct Session {
    cipher_suite: Option<CipherSuite>,
    protocol_version: Option<ProtocolVersion>,
    alpn_protocol: Option<Vec<u8>>,
    server_name: Option<String>,
    peer_certificates: Vec<Vec<u8>>,
    verification_result: Option<VerificationResult>,
    extended_master_secret: bool,
}

/// TLS stream wrapping an underlying transport.
pub struct TlsStream<S> {
    inner: S,
    side: Side,
    provider: Arc<dyn CryptoProvider>,
    record_layer: RecordLayer,
    read_protection: Option<RecordProtection>,
    write_protection: Option<RecordProtection>,
    reassembler: HandshakeReassembler,
    plaintext: BytesMut,
    session: Session,
    received_close_notify: bool,
    sent_close_notify: bool,
    failed: bool,
}

impl<S: std::fmt::Debug> std::fmt::Debug for TlsStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsStream")
            .field("inner", &self.inner)
            .field("side", &self.side)
            .field("session", &self.session)
            .field("received_close_notify", &self.received_close_notify)
            .field("sent_close_notify", &self.sent_close_notify)
            .finish_non_exhaustive()
    }
}

impl<S: Read + Write> TlsStream<S> {
    fn new(
        inner: S,
        side: Side,
        provider: Arc<dyn CryptoProvider>,
        max_fragment_length: u16,
    ) -> Self {
        Self {
            inner,
            side,
            provider,
            record_layer: RecordLayer::new(max_fragment_length),
            read_protection: None,
            write_protection: None,
            reassembler: HandshakeReassembler::new(),
            plaintext: BytesMut::new(),
            session: Session::default(),
            received_close_notify: false,
            sent_close_notify: false,
            failed: false,
        }
    }

    /// Connect to a server (client-side).
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `server_name` - Server name for SNI and certificate verification
    /// * `stream` - Underlying transport stream
    ///
    /// A server that only speaks TLS 1.3 makes this fail with
    /// [`Error::AlertReceived`]`(ProtocolVersion)` if it refuses the
    /// ClientHello, or [`Error::ProtocolError`]`(ProtocolVersion)` if it
    /// answers with a TLS 1.3 ServerHello.
    pub fn connect(config: ClientConfig, server_name: &str, stream: S) -> Result<Self> {
        let mut tls = Self::new(
            stream,
            Side::Client,
            config.provider.clone(),
            config.config.max_fragment_length,
        );
        let mut handshake = ClientHandshake::new(config.handshake_config(server_name));

        let result = tls.client_handshake(&mut handshake);
        tls.finish_handshake(result)?;

        tls.session = Session {
            cipher_suite: handshake.cipher_suite(),
            protocol_version: handshake.protocol_version(),
            alpn_protocol: handshake.alpn_protocol().map(<[u8]>::to_vec),
            server_name: (!server_name.is_empty()).then(|| server_name.to_string()),
            peer_certificates: handshake.peer_certificates().to_vec(),
            verification_result: handshake.verification_result().cloned(),
            extended_master_secret: handshake.extended_master_secret(),
        };
        Ok(tls)
    }

    /// Accept a connection (server-side).
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `stream` - Underlying transport stream
    pub fn accept(config: ServerConfig, stream: S) -> Result<Self> {
        let mut tls = Self::new(
            stream,
            Side::Server,
            config.provider.clone(),
            config.config.max_fragment_length,
        );
        let mut handshake = ServerHandshake::new(config.handshake_config());

        let result = tls.server_handshake(&mut handshake);
        tls.finish_handshake(result)?;

        tls.session = Session {
            cipher_suite: handshake.cipher_suite(),
            protocol_version: handshake.protocol_version(),
            alpn_protocol: handshake.alpn_protocol().map(<[u8]>::to_vec),
            server_name: handshake.server_name().map(String::from),
            peer_certificates: Vec::new(),
            verification_result: None,
            extended_master_secret: handshake.extended_master_secret(),
        };
        Ok(tls)
    }

    fn finish_handshake(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                debug!(side = ?self.side, "Handshake complete");
                Ok(())
            },
            Err(e) => {
                warn!(side = ?self.side, error = %e, "Handshake failed");
                self.fail(&e);
                Err(e)
            },
        }
    }

    fn client_handshake(&mut self, handshake: &mut ClientHandshake) -> Result<()> {
        let shared = Arc::clone(&self.provider);
        let provider = shared.as_ref();

        let client_hello = handshake.client_hello(provider)?;
        self.write_records(ContentType::Handshake, &client_hello)?;

        let flight = loop {
            let (msg_type, raw) = self.read_handshake_message()?;
            match msg_type {
                HandshakeType::HelloRequest => {
                    trace!("Ignoring HelloRequest during handshake");
                },
                HandshakeType::ServerHello => handshake.process_server_hello(&raw)?,
                HandshakeType::Certificate => handshake.process_certificate(&raw)?,
                HandshakeType::ServerKeyExchange => {
                    handshake.process_server_key_exchange(provider, &raw)?
                },
                HandshakeType::CertificateRequest => handshake.process_certificate_request(&raw)?,
                HandshakeType::ServerHelloDone => {
                    break handshake.process_server_hello_done(provider, &raw)?;
                },
                other => {
                    return Err(Error::UnexpectedMessage(format!(
                        "Cannot process {:?} in state {:?}",
                        other,
                        handshake.state()
                    )));
                },
            }
        };

        let (client_write, server_write) = traffic_protection(handshake.key_material())?;
        self.write_records(ContentType::Handshake, &flight.messages.concat())?;
        self.write_change_cipher_spec(client_write)?;
        self.write_records(ContentType::Handshake, &flight.finished)?;

        let payload = self.read_change_cipher_spec()?;
        handshake.process_change_cipher_spec(&payload)?;
        self.read_protection = Some(server_write);

        let (msg_type, raw) = self.read_handshake_message()?;
        if msg_type != HandshakeType::Finished {
            return Err(Error::UnexpectedMessage(format!(
                "Expected Finished, got {:?}",
                msg_type
            )));
        }
        handshake.process_server_finished(provider, &raw)?;

        debug_assert_eq!(handshake.state(), ClientState::Connected);
        self.check_no_pending_handshake()
    }

    fn server_handshake(&mut self, handshake: &mut ServerHandshake) -> Result<()> {
        let shared = Arc::clone(&self.provider);
        let provider = shared.as_ref();

        let (_, client_hello) = self.read_handshake_message()?;
        let flight = handshake.process_client_hello(provider, &client_hello)?;
        self.write_records(ContentType::Handshake, &flight.concat())?;

        let (_, client_key_exchange) = self.read_handshake_message()?;
        handshake.process_client_key_exchange(provider, &client_key_exchange)?;
        let (client_write, server_write) = traffic_protection(handshake.key_material())?;

        let payload = self.read_change_cipher_spec()?;
        handshake.process_change_cipher_spec(&payload)?;
        self.read_protection = Some(client_write);

        let (_, finished) = self.read_handshake_message()?;
        let server_finished = handshake.process_client_finished(provider, &finished)?;

        self.write_change_cipher_spec(server_write)?;
        self.write_records(ContentType::Handshake, &server_finished)?;

        debug_assert_eq!(handshake.state(), ServerState::Connected);
        self.check_no_pending_handshake()
    }

    fn check_no_pending_handshake(&self) -> Result<()> {
        if self.reassembler.is_empty() {
            Ok(())
        } else {
            Err(Error::UnexpectedMessage(
                "Handshake data after Finished".into(),
            ))
        }
    }

    /// Read one record and return its (decrypted) content.
    fn read_record(&mut self) -> Result<(ContentType, Vec<u8>)> {
        let mut header = [0u8; RECORD_HEADER_SIZE];
        self.inner.read_exact(&mut header)?;
        let header = RecordHeader::parse(&header)?;

        let mut fragment = vec![0u8; header.length];
        self.inner.read_exact(&mut fragment)?;

        let content = match self.read_protection.as_mut() {
            Some(protection) => {
                protection.decrypt(self.provider.as_ref(), header.content_type, &fragment)?
            },
            None if fragment.len() > MAX_FRAGMENT_SIZE => {
                return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
            },
            None => fragment,
        };

        trace!(
            content_type = ?header.content_type,
            length = content.len(),
            "Record received"
        );
        Ok((header.content_type, content))
    }

    /// Read the next complete handshake message during the handshake.
    fn read_handshake_message(&mut self) -> Result<(HandshakeType, Vec<u8>)> {
        loop {
            if let Some((message, raw)) = self.reassembler.next_message()? {
                return Ok((message.msg_type, raw));
            }

            let (content_type, content) = self.read_record()?;
            match content_type {
                ContentType::Handshake => {
                    if content.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::DecodeError));
                    }
                    self.reassembler.push(&content);
                },
                ContentType::Alert => {
                    self.process_alert(&content)?;
                    if self.received_close_notify {
                        return Err(Error::ConnectionClosed);
                    }
                },
                other => {
                    return Err(Error::UnexpectedMessage(format!(
                        "Expected a handshake record, got {:?}",
                        other
                    )));
                },
            }
        }
    }

    /// Read the peer's ChangeCipherSpec payload.
    fn read_change_cipher_spec(&mut self) -> Result<Vec<u8>> {
        loop {
            if !self.reassembler.is_empty() {
                return Err(Error::UnexpectedMessage(
                    "Handshake data before ChangeCipherSpec".into(),
                ));
            }

            let (content_type, content) = self.read_record()?;
            match content_type {
                ContentType::ChangeCipherSpec => return Ok(content),
                ContentType::Alert => {
                    self.process_alert(&content)?;
                    if self.received_close_notify {
                        return Err(Error::ConnectionClosed);
                    }
                },
                other => {
                    return Err(Error::UnexpectedMessage(format!(
                        "Expected ChangeCipherSpec, got {:?}",
                        other
                    )));
                },
            }
        }
    }

    /// Handle a received alert record.
    ///
    /// Fatal alerts become [`Error::AlertReceived`], whatever their
    /// description; `close_notify` is recorded; other warnings are logged
    /// and ignored. A record may hold several alerts.
    fn process_alert(&mut self, content: &[u8]) -> Result<()> {
        for alert in Alert::decode_all(content)? {
            if alert.is_fatal() {
                warn!(description = ?alert.description, "Received fatal alert");
                return Err(Error::AlertReceived(alert.description));
            }

            if alert.is_close_notify() {
                debug!("Received close_notify");
                self.received_close_notify = true;
                return Ok(());
            }

            debug!(description = ?alert.description, "Ignoring warning alert");
        }
        Ok(())
    }

    /// Fragment, protect and send `data` as records of `content_type`.
    fn write_records(&mut self, content_type: ContentType, data: &[u8]) -> Result<()> {
        let mut wire = Vec::with_capacity(data.len() + RECORD_HEADER_SIZE);

        for record in self.record_layer.fragment(content_type, data) {
            let fragment = match self.write_protection.as_mut() {
                Some(protection) => {
                    protection.encrypt(self.provider.as_ref(), content_type, &record.fragment)?
                },
                None => record.fragment,
            };
            wire.extend_from_slice(&TlsPlaintext::new(content_type, fragment).encode()?);
        }

        self.inner.write_all(&wire)?;
        self.inner.flush()?;
        Ok(())
    }

    fn write_change_cipher_spec(&mut self, protection: RecordProtection) -> Result<()> {
        self.write_records(ContentType::ChangeCipherSpec, &CHANGE_CIPHER_SPEC_PAYLOAD)?;
        self.write_protection = Some(protection);
        trace!("Write protection active");
        Ok(())
    }

    fn send_alert(&mut self, alert: Alert) -> Result<()> {
        debug!(level = ?alert.level, description = ?alert.description, "Sending alert");
        self.write_records(ContentType::Alert, &alert.encode())
    }

    /// Mark the stream failed, telling the peer why when an alert applies.
    fn fail(&mut self, error: &Error) {
        self.failed = true;
        if let Some(description) = error.alert_description() {
            if let Err(e) = self.send_alert(Alert::fatal(description)) {
                debug!(error = %e, "Could not send fatal alert");
            }
        }
    }

    /// Read records until application data is buffered or the peer closes.
    fn fill_plaintext(&mut self) -> Result<()> {
        while self.plaintext.is_empty() && !self.received_close_notify {
            let (content_type, content) = self.read_record()?;
            match content_type {
                ContentType::ApplicationData => self.plaintext.extend_from_slice(&content),
                ContentType::Alert => self.process_alert(&content)?,
                ContentType::Handshake => {
                    if content.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::DecodeError));
                    }
                    self.reassembler.push(&content);
                    while let Some((message, _)) = self.reassembler.next_message()? {
                        self.refuse_renegotiation(message.msg_type)?;
                    }
                },
                ContentType::ChangeCipherSpec => {
                    return Err(Error::UnexpectedMessage(
                        "ChangeCipherSpec after the handshake".into(),
                    ));
                },
            }
        }
        Ok(())
    }

    fn refuse_renegotiation(&mut self, msg_type: HandshakeType) -> Result<()> {
        let is_renegotiation = matches!(
            (self.side, msg_type),
            (Side::Client, HandshakeType::HelloRequest) | (Side::Server, HandshakeType::ClientHello)
        );
        if !is_renegotiation {
            return Err(Error::UnexpectedMessage(format!(
                "Cannot process {:?} after the handshake",
                msg_type
            )));
        }

        debug!(?msg_type, "Refusing renegotiation");
        self.send_alert(Alert::for_description(AlertDescription::NoRenegotiation))
    }

    /// Send `close_notify`. Further writes fail; reads drain what the peer
    /// still sends.
    pub fn close(&mut self) -> Result<()> {
        if self.sent_close_notify || self.failed {
            return Ok(());
        }
        self.sent_close_notify = true;
        self.send_alert(Alert::close_notify())
    }
}

impl<S> TlsStream<S> {
    /// Negotiated cipher suite.
    pub fn negotiated_cipher_suite(&self) -> Option<CipherSuite> {
        self.session.cipher_suite
    }

    /// Negotiated protocol version (always TLS 1.2).
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.session.protocol_version
    }

    /// Protocol selected by ALPN.
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.session.alpn_protocol.as_deref()
    }

    /// Server name: the name connected to (client) or the SNI received
    /// (server).
    pub fn server_name(&self) -> Option<&str> {
        self.session.server_name.as_deref()
    }

    /// Certificate chain presented by the server (client side only).
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.session.peer_certificates
    }

    /// Outcome of server certificate verification (client side only).
    pub fn verification_result(&self) -> Option<&VerificationResult> {
        self.session.verification_result.as_ref()
    }

    /// Whether the extended master secret was negotiated.
    pub fn extended_master_secret(&self) -> bool {
        self.session.extended_master_secret
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the underlying transport.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

/// Record protection for (client writes, server writes).
fn traffic_protection(keys: Option<&KeyMaterial>) -> Result<(RecordProtection, RecordProtection)> {
    let keys = keys.ok_or_else(|| Error::InternalError("Traffic keys not derived".into()))?;
    Ok((keys.client_write()?, keys.server_write()?))
}

fn to_io_error(error: Error) -> io::Error {
    let kind = match &error {
        Error::ConnectionClosed => io::ErrorKind::UnexpectedEof,
        Error::IoError(_) => io::ErrorKind::Other,
        Error::AlertReceived(_) => io::ErrorKind::ConnectionAborted,
        _ => io::ErrorKind::InvalidData,
    };
    io::Error::new(kind, error)
}

impl<S: Read + Write> Read for TlsStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "TLS connection failed",
            ));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.fill_plaintext() {
            self.fail(&e);
            return Err(to_io_error(e));
        }

        // close_notify with nothing buffered is EOF
        let n = buf.len().min(self.plaintext.len());
        buf[..n].copy_from_slice(&self.plaintext[..n]);
        self.plaintext.advance(n);
        Ok(n)
    }
}

impl<S: Read + Write> Write for TlsStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed || self.sent_close_notify {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "TLS connection closed for writing",
            ));
        }
        if buf.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.write_records(ContentType::ApplicationData, buf) {
            self.failed = true;
            return Err(to_io_error(e));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
