//! TLS 1.2 client handshake state machine.
//!
//! ```text
//! Start
//!   | send ClientHello
//!   v
//! WaitServerHello
//!   | recv ServerHello (version checked first)
//!   v
//! WaitCertificate
//!   | recv Certificate
//!   v
//! WaitServerKeyExchange
//!   | recv ServerKeyExchange (signature verified)
//!   v
//! WaitServerHelloDone
//!   | [recv CertificateRequest]
//!   | recv ServerHelloDone
//!   | send [Certificate], ClientKeyExchange, ChangeCipherSpec, Finished
//!   v
//! WaitChangeCipherSpec
//!   | recv ChangeCipherSpec
//!   v
//! WaitFinished
//!   | recv Finished
//!   v
//! Connected
//! ```

use super::{derive_secrets, encode_handshake, expect_message};
use crate::certificate::{
    extract_public_key, verify_with_mode, AuthMode, PinnedCertificateVerifier, ServerCertVerifier,
    SubjectPublicKey, VerificationResult,
};
use crate::cipher_suites::{default_cipher_suites, CipherSuite};
use crate::error::{Error, ProtocolError, Result};
use crate::extensions::{
    alpn_extension, default_signature_algorithms, default_supported_groups,
    ec_point_formats_extension, extended_master_secret_extension, parse_alpn,
    parse_ec_point_formats, parse_renegotiation_info, renegotiation_info_extension,
    server_name_extension, signature_algorithms_extension, supported_groups_extension,
    Extensions, EC_POINT_FORMAT_UNCOMPRESSED,
};
use crate::key_exchange::{compute_premaster_secret, generate_key_pair, EphemeralKeyPair};
use crate::messages::{
    CertificateMessage, CertificateRequest, ClientHello, ClientKeyExchange, Finished, ServerHello,
    ServerHelloDone, ServerKeyExchange,
};
use crate::prf::{compute_verify_data, CLIENT_FINISHED_LABEL, SERVER_FINISHED_LABEL};
use crate::protocol::{ExtensionType, HandshakeType, ProtocolVersion};
use crate::record_protection::KeyMaterial;
use crate::transcript::HandshakeTranscript;
use crate::version::{check_server_hello_version, client_hello_versions};
use std::net::IpAddr;
use std::sync::Arc;
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureAlgorithm};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

/// Client handshake parameters.
#[derive(Debug, Clone)]
pub struct ClientHandshakeConfig {
    /// Offered cipher suites, in preference order
    pub cipher_suites: Vec<CipherSuite>,
    /// Offered groups, in preference order
    pub groups: Vec<KeyExchangeAlgorithm>,
    /// Accepted ServerKeyExchange signature algorithms
    pub signature_algorithms: Vec<SignatureAlgorithm>,
    /// ALPN protocols to offer (none means no ALPN extension)
    pub alpn_protocols: Vec<Vec<u8>>,
    /// Server name for SNI and certificate verification
    pub server_name: Option<String>,
    /// Certificate trust decision
    pub verifier: Arc<dyn ServerCertVerifier>,
    /// What to do when the verifier rejects the server
    pub auth_mode: AuthMode,
    /// Abort unless the server negotiates the extended master secret
    pub require_extended_master_secret: bool,
}

impl Default for ClientHandshakeConfig {
    fn default() -> Self {
        Self {
            cipher_suites: default_cipher_suites(),
            groups: default_supported_groups(),
            signature_algorithms: default_signature_algorithms(),
            alpn_protocols: Vec::new(),
            server_name: None,
            verifier: Arc::new(PinnedCertificateVerifier::default()),
            auth_mode: AuthMode::Required,
            require_extended_master_secret: false,
        }
    }
}

/// Client handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Ready to send ClientHello
    Start,
    /// Waiting for ServerHello
    WaitServerHello,
    /// Waiting for Certificate
    WaitCertificate,
    /// Waiting for ServerKeyExchange
    WaitServerKeyExchange,
    /// Waiting for ServerHelloDone (or CertificateRequest)
    WaitServerHelloDone,
    /// Waiting for the server's ChangeCipherSpec
    WaitChangeCipherSpec,
    /// Waiting for the server's Finished
    WaitFinished,
    /// Handshake complete
    Connected,
    /// Handshake aborted
    Failed,
}

/// Messages the client sends after ServerHelloDone.
///
/// `messages` go out as plaintext handshake records, then a
/// ChangeCipherSpec record, then `finished` under the client write keys.
#[derive(Debug, Clone)]
pub struct ClientFinishedFlight {
    /// [Certificate], ClientKeyExchange
    pub messages: Vec<Vec<u8>>,
    /// Client Finished
    pub finished: Vec<u8>,
}

/// TLS 1.2 client handshake.
pub struct ClientHandshake {
    config: ClientHandshakeConfig,
    state: ClientState,
    transcript: HandshakeTranscript,
    client_random: [u8; 32],
    server_random: [u8; 32],
    version: Option<ProtocolVersion>,
    cipher_suite: Option<CipherSuite>,
    extended_master_secret: bool,
    secure_renegotiation: bool,
    alpn_protocol: Option<Vec<u8>>,
    server_certificates: Vec<Vec<u8>>,
    server_public_key: Option<SubjectPublicKey>,
    verification_result: Option<VerificationResult>,
    certificate_requested: bool,
    key_pair: Option<EphemeralKeyPair>,
    server_ecdh_public: Option<Vec<u8>>,
    master_secret: Option<Zeroizing<Vec<u8>>>,
    key_material: Option<KeyMaterial>,
}

impl std::fmt::Debug for ClientHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandshake")
            .field("state", &self.state)
            .field("cipher_suite", &self.cipher_suite)
            .field("extended_master_secret", &self.extended_master_secret)
            .finish_non_exhaustive()
    }
}

impl ClientHandshake {
    /// Create a client handshake.
    pub fn new(config: ClientHandshakeConfig) -> Self {
        Self {
            config,
            state: ClientState::Start,
            transcript: HandshakeTranscript::new(),
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            version: None,
            cipher_suite: None,
            extended_master_secret: false,
            secure_renegotiation: false,
            alpn_protocol: None,
            server_certificates: Vec::new(),
            server_public_key: None,
            verification_result: None,
            certificate_requested: false,
            key_pair: None,
            server_ecdh_public: None,
            master_secret: None,
            key_material: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// True once the server's Finished has been verified.
    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Connected
    }

    /// Negotiated protocol version.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    /// Negotiated cipher suite.
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.cipher_suite
    }

    /// Protocol selected by ALPN.
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.alpn_protocol.as_deref()
    }

    /// Server name sent in SNI.
    pub fn server_name(&self) -> Option<&str> {
        self.config.server_name.as_deref()
    }

    /// Certificate chain presented by the server.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.server_certificates
    }

    /// Outcome of server certificate verification.
    pub fn verification_result(&self) -> Option<&VerificationResult> {
        self.verification_result.as_ref()
    }

    /// Whether the extended master secret was negotiated.
    pub fn extended_master_secret(&self) -> bool {
        self.extended_master_secret
    }

    /// Whether the server sent renegotiation_info.
    pub fn secure_renegotiation(&self) -> bool {
        self.secure_renegotiation
    }

    /// Traffic keys, available from ServerHelloDone on.
    pub fn key_material(&self) -> Option<&KeyMaterial> {
        self.key_material.as_ref()
    }

    fn expect_state(&self, expected: ClientState, message: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::UnexpectedMessage(format!(
                "Cannot process {} in state {:?}",
                message, self.state
            )));
        }
        Ok(())
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            debug!(state = ?self.state, error = %e, "Client handshake failed");
            self.state = ClientState::Failed;
        }
        result
    }

    fn suite(&self) -> Result<CipherSuite> {
        self.cipher_suite
            .ok_or_else(|| Error::InternalError("No cipher suite negotiated".into()))
    }

    /// Build the ClientHello (header included).
    pub fn client_hello(&mut self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        let result = self.build_client_hello(provider);
        self.track(result)
    }

    fn build_client_hello(&mut self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        if self.state != ClientState::Start {
            return Err(Error::InternalError(format!(
                "Cannot send ClientHello in state {:?}",
                self.state
            )));
        }
        if self.config.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("No cipher suites configured".into()));
        }

        self.client_random = provider.random().array32()?;

        let mut extensions = Extensions::new();
        if let Some(name) = &self.config.server_name {
            // RFC 6066: literal addresses are not sent as host names
            if name.parse::<IpAddr>().is_err() {
                extensions.add(server_name_extension(name)?);
            }
        }
        extensions.add(supported_groups_extension(&self.config.groups));
        extensions.add(ec_point_formats_extension());
        extensions.add(signature_algorithms_extension(
            &self.config.signature_algorithms,
        ));
        if !self.config.alpn_protocols.is_empty() {
            extensions.add(alpn_extension(&self.config.alpn_protocols)?);
        }
        extensions.add(extended_master_secret_extension());
        extensions.add(renegotiation_info_extension(&[]));

        let mut hello = ClientHello::new(self.client_random, &self.config.cipher_suites)
            .with_extensions(extensions);
        hello.client_version = client_hello_versions();

        let encoded = encode_handshake(HandshakeType::ClientHello, hello.encode()?)?;
        self.transcript.update(&encoded);

        debug!(
            suites = self.config.cipher_suites.len(),
            server_name = ?self.config.server_name,
            "Sending ClientHello"
        );
        self.state = ClientState::WaitServerHello;
        Ok(encoded)
    }

    /// Process ServerHello.
    pub fn process_server_hello(&mut self, raw: &[u8]) -> Result<()> {
        let result = self.handle_server_hello(raw);
        self.track(result)
    }

    fn handle_server_hello(&mut self, raw: &[u8]) -> Result<()> {
        self.expect_state(ClientState::WaitServerHello, "ServerHello")?;
        let message = expect_message(raw, HandshakeType::ServerHello)?;
        let hello = ServerHello::decode(&message.payload)?;

        // Version first: a TLS 1.3 answer must fail as protocol_version
        let version = check_server_hello_version(&hello)?;

        if hello.compression_method != 0 {
            return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
        }

        let suite = hello
            .suite()
            .filter(|s| self.config.cipher_suites.contains(s))
            .ok_or_else(|| {
                warn!(suite = hello.cipher_suite, "Server selected a suite that was not offered");
                Error::ProtocolError(ProtocolError::IllegalParameter)
            })?;

        for ext in hello.extensions.iter() {
            match ext.extension_type {
                ExtensionType::ServerName => {
                    if self.config.server_name.is_none() {
                        return Err(Error::ProtocolError(ProtocolError::UnsupportedExtension));
                    }
                    if !ext.data.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::DecodeError));
                    }
                },
                ExtensionType::EcPointFormats => {
                    if !parse_ec_point_formats(&ext.data)?.contains(&EC_POINT_FORMAT_UNCOMPRESSED) {
                        return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
                    }
                },
                ExtensionType::ApplicationLayerProtocolNegotiation => {
                    if self.config.alpn_protocols.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::UnsupportedExtension));
                    }
                    let mut selected = parse_alpn(&ext.data)?;
                    if selected.len() != 1 || !self.config.alpn_protocols.contains(&selected[0]) {
                        return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
                    }
                    self.alpn_protocol = selected.pop();
                },
                ExtensionType::ExtendedMasterSecret => {
                    if !ext.data.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::DecodeError));
                    }
                    self.extended_master_secret = true;
                },
                ExtensionType::RenegotiationInfo => {
                    if !parse_renegotiation_info(&ext.data)?.is_empty() {
                        return Err(Error::ProtocolError(ProtocolError::HandshakeFailure));
                    }
                    self.secure_renegotiation = true;
                },
                other => {
                    warn!(extension = ?other, "Server sent an unsolicited extension");
                    return Err(Error::ProtocolError(ProtocolError::UnsupportedExtension));
                },
            }
        }

        if self.config.require_extended_master_secret && !self.extended_master_secret {
            return Err(Error::HandshakeFailure(
                "Server does not support the extended master secret".into(),
            ));
        }
        if !self.secure_renegotiation {
            debug!("Server does not indicate secure renegotiation support");
        }

        self.server_random = hello.random;
        self.version = Some(version);
        self.cipher_suite = Some(suite);
        self.transcript.update(raw);

        debug!(
            %version,
            %suite,
            ems = self.extended_master_secret,
            alpn = ?self.alpn_protocol.as_deref().map(String::from_utf8_lossy),
            "ServerHello accepted"
        );
        self.state = ClientState::WaitCertificate;
        Ok(())
    }

    /// Process the server Certificate.
    pub fn process_certificate(&mut self, raw: &[u8]) -> Result<()> {
        let result = self.handle_certificate(raw);
        self.track(result)
    }

    fn handle_certificate(&mut self, raw: &[u8]) -> Result<()> {
        self.expect_state(ClientState::WaitCertificate, "Certificate")?;
        let message = expect_message(raw, HandshakeType::Certificate)?;
        let certificate = CertificateMessage::decode(&message.payload)?;

        let leaf = certificate.leaf().ok_or_else(|| {
            Error::HandshakeFailure("Server sent an empty certificate chain".into())
        })?;
        let public_key = extract_public_key(leaf)?;

        let verification = verify_with_mode(
            self.config.verifier.as_ref(),
            self.config.auth_mode,
            &certificate.certificate_list,
            self.config.server_name.as_deref(),
        )?;
        trace!(
            chain_length = certificate.certificate_list.len(),
            ?verification,
            "Server certificate processed"
        );

        self.server_public_key = Some(public_key);
        self.verification_result = Some(verification);
        self.server_certificates = certificate.certificate_list;
        self.transcript.update(raw);
        self.state = ClientState::WaitServerKeyExchange;
        Ok(())
    }

    /// Process ServerKeyExchange and generate the client's ephemeral key.
    pub fn process_server_key_exchange(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<()> {
        let result = self.handle_server_key_exchange(provider, raw);
        self.track(result)
    }

    fn handle_server_key_exchange(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<()> {
        self.expect_state(ClientState::WaitServerKeyExchange, "ServerKeyExchange")?;
        let message = expect_message(raw, HandshakeType::ServerKeyExchange)?;
        let ske = ServerKeyExchange::decode(&message.payload)?;

        if !self.config.groups.contains(&ske.group) {
            warn!(group = %ske.group.name(), "Server chose a group that was not offered");
            return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
        }
        if ske.public_key.len() != ske.group.public_key_size() {
            return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
        }

        let scheme = SignatureAlgorithm::from_u16(ske.signature_algorithm)
            .filter(|s| self.config.signature_algorithms.contains(s))
            .ok_or(Error::ProtocolError(ProtocolError::IllegalParameter))?;
        let server_key = self
            .server_public_key
            .as_ref()
            .ok_or_else(|| Error::InternalError("No server certificate key".into()))?;
        if server_key.algorithm != scheme {
            return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
        }

        provider.signature(scheme)?.verify(
            &server_key.key_bytes,
            &ske.signed_params(&self.client_random, &self.server_random),
            &ske.signature,
        )?;
        trace!(scheme = scheme.name(), "ServerKeyExchange signature verified");

        self.key_pair = Some(generate_key_pair(provider, ske.group)?);
        self.server_ecdh_public = Some(ske.public_key);
        self.transcript.update(raw);
        self.state = ClientState::WaitServerHelloDone;
        Ok(())
    }

    /// Process a CertificateRequest; the client will answer with no certificate.
    pub fn process_certificate_request(&mut self, raw: &[u8]) -> Result<()> {
        let result = self.handle_certificate_request(raw);
        self.track(result)
    }

    fn handle_certificate_request(&mut self, raw: &[u8]) -> Result<()> {
        self.expect_state(ClientState::WaitServerHelloDone, "CertificateRequest")?;
        if self.certificate_requested {
            return Err(Error::UnexpectedMessage(
                "Duplicate CertificateRequest".into(),
            ));
        }
        let message = expect_message(raw, HandshakeType::CertificateRequest)?;
        CertificateRequest::decode(&message.payload)?;

        debug!("Server requested a client certificate; none will be sent");
        self.certificate_requested = true;
        self.transcript.update(raw);
        Ok(())
    }

    /// Process ServerHelloDone and build the client's second flight.
    pub fn process_server_hello_done(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<ClientFinishedFlight> {
        let result = self.handle_server_hello_done(provider, raw);
        self.track(result)
    }

    fn handle_server_hello_done(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<ClientFinishedFlight> {
        self.expect_state(ClientState::WaitServerHelloDone, "ServerHelloDone")?;
        let message = expect_message(raw, HandshakeType::ServerHelloDone)?;
        ServerHelloDone::decode(&message.payload)?;
        self.transcript.update(raw);

        let suite = self.suite()?;
        let mut messages = Vec::new();

        if self.certificate_requested {
            let certificate = encode_handshake(
                HandshakeType::Certificate,
                CertificateMessage::default().encode()?,
            )?;
            self.transcript.update(&certificate);
            messages.push(certificate);
        }

        let key_pair = self
            .key_pair
            .take()
            .ok_or_else(|| Error::InternalError("No ephemeral key pair".into()))?;
        let server_public = self
            .server_ecdh_public
            .take()
            .ok_or_else(|| Error::InternalError("No server ECDH key".into()))?;
        let premaster = compute_premaster_secret(provider, &key_pair, &server_public)?;

        let client_key_exchange = encode_handshake(
            HandshakeType::ClientKeyExchange,
            ClientKeyExchange::new(key_pair.public_key.clone()).encode()?,
        )?;
        self.transcript.update(&client_key_exchange);
        messages.push(client_key_exchange);

        let (master_secret, keys) = derive_secrets(
            provider,
            suite,
            &premaster,
            &self.transcript,
            &self.client_random,
            &self.server_random,
            self.extended_master_secret,
        )?;

        let handshake_hash = self.transcript.current_hash(provider, suite.hash_algorithm())?;
        let verify_data = compute_verify_data(
            provider,
            suite.hash_algorithm(),
            &master_secret,
            CLIENT_FINISHED_LABEL,
            &handshake_hash,
        )?;
        let finished =
            encode_handshake(HandshakeType::Finished, Finished::new(verify_data).encode())?;
        self.transcript.update(&finished);

        self.master_secret = Some(master_secret);
        self.key_material = Some(keys);
        self.state = ClientState::WaitChangeCipherSpec;
        debug!(group = key_pair.group.name(), "Sending ClientKeyExchange and Finished");

        Ok(ClientFinishedFlight { messages, finished })
    }

    /// Process the server's ChangeCipherSpec payload.
    pub fn process_change_cipher_spec(&mut self, payload: &[u8]) -> Result<()> {
        let result = self
            .expect_state(ClientState::WaitChangeCipherSpec, "ChangeCipherSpec")
            .and_then(|_| super::check_change_cipher_spec(payload));
        let result = self.track(result);
        if result.is_ok() {
            self.state = ClientState::WaitFinished;
        }
        result
    }

    /// Verify the server Finished.
    pub fn process_server_finished(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<()> {
        let result = self.handle_server_finished(provider, raw);
        self.track(result)
    }

    fn handle_server_finished(&mut self, provider: &dyn CryptoProvider, raw: &[u8]) -> Result<()> {
        self.expect_state(ClientState::WaitFinished, "Finished")?;
        let message = expect_message(raw, HandshakeType::Finished)?;
        let finished = Finished::decode(&message.payload)?;

        let suite = self.suite()?;
        let master_secret = self
            .master_secret
            .take()
            .ok_or_else(|| Error::InternalError("No master secret".into()))?;
        let handshake_hash = self.transcript.current_hash(provider, suite.hash_algorithm())?;
        let expected = compute_verify_data(
            provider,
            suite.hash_algorithm(),
            &master_secret,
            SERVER_FINISHED_LABEL,
            &handshake_hash,
        )?;

        if !finished.matches(&expected) {
            warn!("Server Finished verify_data mismatch");
            return Err(Error::ProtocolError(ProtocolError::DecryptError));
        }

        self.transcript.update(raw);
        self.state = ClientState::Connected;
        debug!(%suite, "Client handshake complete");
        Ok(())
    }
}
