//! TLS 1.2 server handshake state machine.
//!
//! ```text
//! Start
//!   | recv ClientHello (version negotiated first)
//!   | send ServerHello, Certificate, ServerKeyExchange, ServerHelloDone
//!   v
//! WaitClientKeyExchange
//!   | recv ClientKeyExchange
//!   v
//! WaitChangeCipherSpec
//!   | recv ChangeCipherSpec
//!   v
//! WaitFinished
//!   | recv Finished
//!   | send ChangeCipherSpec, Finished
//!   v
//! Connected
//! ```

use super::{derive_secrets, encode_handshake, expect_message};
use crate::cipher_suites::{default_cipher_suites, CipherSuite, EMPTY_RENEGOTIATION_INFO_SCSV};
use crate::error::{Error, ProtocolError, Result};
use crate::extensions::{
    alpn_extension, default_supported_groups, ec_point_formats_extension,
    extended_master_secret_extension, parse_alpn, parse_ec_point_formats,
    parse_renegotiation_info, parse_server_name, parse_signature_algorithms,
    parse_supported_groups, renegotiation_info_extension, Extension, Extensions,
    EC_POINT_FORMAT_UNCOMPRESSED,
};
use crate::key_exchange::{compute_premaster_secret, generate_key_pair, EphemeralKeyPair};
use crate::messages::{
    CertificateMessage, ClientHello, ClientKeyExchange, Finished, ServerHello, ServerHelloDone,
    ServerKeyExchange,
};
use crate::prf::{compute_verify_data, CLIENT_FINISHED_LABEL, SERVER_FINISHED_LABEL};
use crate::protocol::{ExtensionType, HandshakeType, ProtocolVersion};
use crate::record_protection::KeyMaterial;
use crate::transcript::HandshakeTranscript;
use crate::version::negotiate_server_version;
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureAlgorithm, SigningKey};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

/// Server handshake parameters.
#[derive(Debug, Clone)]
pub struct ServerHandshakeConfig {
    /// Enabled cipher suites, in server preference order
    pub cipher_suites: Vec<CipherSuite>,
    /// Enabled groups, in server preference order
    pub groups: Vec<KeyExchangeAlgorithm>,
    /// ALPN protocols, in server preference order
    pub alpn_protocols: Vec<Vec<u8>>,
    /// DER certificate chain, leaf first (P-256 key)
    pub certificate_chain: Vec<Vec<u8>>,
    /// ECDSA P-256 private key matching the leaf certificate
    pub private_key: SigningKey,
    /// Refuse clients that do not offer the extended master secret
    pub require_extended_master_secret: bool,
}

impl ServerHandshakeConfig {
    /// Parameters with default suites and groups.
    pub fn new(certificate_chain: Vec<Vec<u8>>, private_key: SigningKey) -> Self {
        Self {
            cipher_suites: default_cipher_suites(),
            groups: default_supported_groups(),
            alpn_protocols: Vec::new(),
            certificate_chain,
            private_key,
            require_extended_master_secret: false,
        }
    }
}

/// Server handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for ClientHello
    Start,
    /// Waiting for ClientKeyExchange
    WaitClientKeyExchange,
    /// Waiting for the client's ChangeCipherSpec
    WaitChangeCipherSpec,
    /// Waiting for the client's Finished
    WaitFinished,
    /// Handshake complete
    Connected,
    /// Handshake aborted
    Failed,
}

/// TLS 1.2 server handshake.
pub struct ServerHandshake {
    config: ServerHandshakeConfig,
    state: ServerState,
    transcript: HandshakeTranscript,
    client_random: [u8; 32],
    server_random: [u8; 32],
    version: Option<ProtocolVersion>,
    cipher_suite: Option<CipherSuite>,
    extended_master_secret: bool,
    secure_renegotiation: bool,
    alpn_protocol: Option<Vec<u8>>,
    server_name: Option<String>,
    key_pair: Option<EphemeralKeyPair>,
    master_secret: Option<Zeroizing<Vec<u8>>>,
    key_material: Option<KeyMaterial>,
}

impl std::fmt::Debug for ServerHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state)
            .field("cipher_suite", &self.cipher_suite)
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

impl ServerHandshake {
    /// Create a server handshake.
    pub fn new(config: ServerHandshakeConfig) -> Self {
        Self {
            config,
            state: ServerState::Start,
            transcript: HandshakeTranscript::new(),
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            version: None,
            cipher_suite: None,
            extended_master_secret: false,
            secure_renegotiation: false,
            alpn_protocol: None,
            server_name: None,
            key_pair: None,
            master_secret: None,
            key_material: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// True once the client's Finished has been verified.
    pub fn is_connected(&self) -> bool {
        self.state == ServerState::Connected
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

    /// Host name the client asked for via SNI.
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Whether the extended master secret was negotiated.
    pub fn extended_master_secret(&self) -> bool {
        self.extended_master_secret
    }

    /// Whether the client signalled secure renegotiation support.
    pub fn secure_renegotiation(&self) -> bool {
        self.secure_renegotiation
    }

    /// Traffic keys, available from ClientKeyExchange on.
    pub fn key_material(&self) -> Option<&KeyMaterial> {
        self.key_material.as_ref()
    }

    fn expect_state(&self, expected: ServerState, message: &str) -> Result<()> {
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
            debug!(state = ?self.state, error = %e, "Server handshake failed");
            self.state = ServerState::Failed;
        }
        result
    }

    fn suite(&self) -> Result<CipherSuite> {
        self.cipher_suite
            .ok_or_else(|| Error::InternalError("No cipher suite negotiated".into()))
    }

    /// Process ClientHello and build the server's first flight.
    ///
    /// Returns ServerHello, Certificate, ServerKeyExchange and
    /// ServerHelloDone, each with its handshake header.
    pub fn process_client_hello(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<Vec<Vec<u8>>> {
        let result = self.handle_client_hello(provider, raw);
        self.track(result)
    }

    fn handle_client_hello(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<Vec<Vec<u8>>> {
        self.expect_state(ServerState::Start, "ClientHello")?;
        let message = expect_message(raw, HandshakeType::ClientHello)?;
        let hello = ClientHello::decode(&message.payload)?;

        let version = negotiate_server_version(&hello)?;

        if !hello.compression_methods.contains(&0) {
            return Err(Error::ProtocolError(ProtocolError::HandshakeFailure));
        }

        let suite = self
            .config
            .cipher_suites
            .iter()
            .copied()
            .find(|s| hello.offers(s.to_u16()))
            .ok_or_else(|| {
                warn!(offered = ?hello.cipher_suites, "No shared cipher suite");
                Error::ProtocolError(ProtocolError::HandshakeFailure)
            })?;

        let mut client_groups = None;
        let mut point_formats_offered = false;
        let mut alpn_offered = None;
        self.secure_renegotiation = hello.offers(EMPTY_RENEGOTIATION_INFO_SCSV);

        for ext in hello.extensions.iter() {
            match ext.extension_type {
                ExtensionType::ServerName => {
                    self.server_name = Some(parse_server_name(&ext.data)?);
                },
                ExtensionType::SupportedGroups => {
                    client_groups = Some(parse_supported_groups(&ext.data)?);
                },
                ExtensionType::EcPointFormats => {
                    if !parse_ec_point_formats(&ext.data)?.contains(&EC_POINT_FORMAT_UNCOMPRESSED) {
                        return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
                    }
                    point_formats_offered = true;
                },
                ExtensionType::SignatureAlgorithms => {
                    let schemes = parse_signature_algorithms(&ext.data)?;
                    if !schemes.contains(&SignatureAlgorithm::EcdsaSecp256r1Sha256) {
                        warn!("Client does not accept ecdsa_secp256r1_sha256 signatures");
                        return Err(Error::ProtocolError(ProtocolError::HandshakeFailure));
                    }
                },
                ExtensionType::ApplicationLayerProtocolNegotiation => {
                    alpn_offered = Some(parse_alpn(&ext.data)?);
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
                other => trace!(extension = ?other, "Ignoring ClientHello extension"),
            }
        }

        let group = self
            .config
            .groups
            .iter()
            .copied()
            .find(|g| client_groups.as_ref().map_or(true, |offered: &Vec<_>| offered.contains(g)))
            .ok_or_else(|| {
                warn!(?client_groups, "No shared group");
                Error::ProtocolError(ProtocolError::HandshakeFailure)
            })?;

        if let Some(offered) = &alpn_offered {
            if !self.config.alpn_protocols.is_empty() {
                let selected = self
                    .config
                    .alpn_protocols
                    .iter()
                    .find(|p| offered.contains(*p))
                    .cloned()
                    .ok_or(Error::ProtocolError(ProtocolError::NoApplicationProtocol))?;
                self.alpn_protocol = Some(selected);
            }
        }

        if self.config.require_extended_master_secret && !self.extended_master_secret {
            return Err(Error::HandshakeFailure(
                "Client does not support the extended master secret".into(),
            ));
        }

        self.client_random = hello.random;
        self.server_random = provider.random().array32()?;
        self.version = Some(version);
        self.cipher_suite = Some(suite);
        self.transcript.update(raw);

        debug!(
            %version,
            %suite,
            group = group.name(),
            ems = self.extended_master_secret,
            server_name = ?self.server_name,
            "ClientHello accepted"
        );

        let mut extensions = Extensions::new();
        if self.secure_renegotiation {
            extensions.add(renegotiation_info_extension(&[]));
        }
        if self.extended_master_secret {
            extensions.add(extended_master_secret_extension());
        }
        if self.server_name.is_some() {
            extensions.add(Extension::new(ExtensionType::ServerName, Vec::new()));
        }
        if point_formats_offered {
            extensions.add(ec_point_formats_extension());
        }
        if let Some(protocol) = &self.alpn_protocol {
            extensions.add(alpn_extension(&[protocol])?);
        }

        let server_hello = ServerHello::new(self.server_random, suite).with_extensions(extensions);
        let certificate = CertificateMessage::new(self.config.certificate_chain.clone());

        let key_pair = generate_key_pair(provider, group)?;
        let params = ServerKeyExchange::params(group, &key_pair.public_key);
        let signed =
            ServerKeyExchange::signed_data(&self.client_random, &self.server_random, &params);
        let scheme = SignatureAlgorithm::EcdsaSecp256r1Sha256;
        let signature = provider
            .signature(scheme)?
            .sign(&self.config.private_key, &signed)?;
        let server_key_exchange = ServerKeyExchange {
            group,
            public_key: key_pair.public_key.clone(),
            signature_algorithm: scheme.to_u16(),
            signature,
        };
        self.key_pair = Some(key_pair);

        let flight = vec![
            encode_handshake(HandshakeType::ServerHello, server_hello.encode()?)?,
            encode_handshake(HandshakeType::Certificate, certificate.encode()?)?,
            encode_handshake(HandshakeType::ServerKeyExchange, server_key_exchange.encode()?)?,
            encode_handshake(HandshakeType::ServerHelloDone, ServerHelloDone.encode())?,
        ];
        for message in &flight {
            self.transcript.update(message);
        }

        self.state = ServerState::WaitClientKeyExchange;
        Ok(flight)
    }

    /// Process ClientKeyExchange and derive the traffic keys.
    pub fn process_client_key_exchange(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<()> {
        let result = self.handle_client_key_exchange(provider, raw);
        self.track(result)
    }

    fn handle_client_key_exchange(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<()> {
        self.expect_state(ServerState::WaitClientKeyExchange, "ClientKeyExchange")?;
        let message = expect_message(raw, HandshakeType::ClientKeyExchange)?;
        let client_key_exchange = ClientKeyExchange::decode(&message.payload)?;

        let key_pair = self
            .key_pair
            .take()
            .ok_or_else(|| Error::InternalError("No ephemeral key pair".into()))?;
        let premaster =
            compute_premaster_secret(provider, &key_pair, &client_key_exchange.public_key)?;
        self.transcript.update(raw);

        let (master_secret, keys) = derive_secrets(
            provider,
            self.suite()?,
            &premaster,
            &self.transcript,
            &self.client_random,
            &self.server_random,
            self.extended_master_secret,
        )?;
        self.master_secret = Some(master_secret);
        self.key_material = Some(keys);

        trace!("Traffic keys derived");
        self.state = ServerState::WaitChangeCipherSpec;
        Ok(())
    }

    /// Process the client's ChangeCipherSpec payload.
    pub fn process_change_cipher_spec(&mut self, payload: &[u8]) -> Result<()> {
        let result = self
            .expect_state(ServerState::WaitChangeCipherSpec, "ChangeCipherSpec")
            .and_then(|_| super::check_change_cipher_spec(payload));
        let result = self.track(result);
        if result.is_ok() {
            self.state = ServerState::WaitFinished;
        }
        result
    }

    /// Verify the client Finished and build the server Finished.
    ///
    /// The caller sends ChangeCipherSpec before the returned message.
    pub fn process_client_finished(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<Vec<u8>> {
        let result = self.handle_client_finished(provider, raw);
        self.track(result)
    }

    fn handle_client_finished(
        &mut self,
        provider: &dyn CryptoProvider,
        raw: &[u8],
    ) -> Result<Vec<u8>> {
        self.expect_state(ServerState::WaitFinished, "Finished")?;
        let message = expect_message(raw, HandshakeType::Finished)?;
        let finished = Finished::decode(&message.payload)?;

        let suite = self.suite()?;
        let hash = suite.hash_algorithm();
        let master_secret = self
            .master_secret
            .take()
            .ok_or_else(|| Error::InternalError("No master secret".into()))?;

        let expected = compute_verify_data(
            provider,
            hash,
            &master_secret,
            CLIENT_FINISHED_LABEL,
            &self.transcript.current_hash(provider, hash)?,
        )?;
        if !finished.matches(&expected) {
            warn!("Client Finished verify_data mismatch");
            return Err(Error::ProtocolError(ProtocolError::DecryptError));
        }
        self.transcript.update(raw);

        let verify_data = compute_verify_data(
            provider,
            hash,
            &master_secret,
            SERVER_FINISHED_LABEL,
            &self.transcript.current_hash(provider, hash)?,
        )?;
        let server_finished =
            encode_handshake(HandshakeType::Finished, Finished::new(verify_data).encode())?;
        self.transcript.update(&server_finished);

        self.state = ServerState::Connected;
        debug!(%suite, "Server handshake complete");
        Ok(server_finished)
    }
}
