//! TLS client configuration.

use std::sync::Arc;
use tls12only_core::certificate::{AuthMode, PinnedCertificateVerifier, ServerCertVerifier};
use tls12only_core::cipher_suites::default_cipher_suites;
use tls12only_core::extensions::default_supported_groups;
use tls12only_core::handshake::ClientHandshakeConfig;
use tls12only_core::{CipherSuite, Config, ConfigBuilder, Error, ProtocolVersion, Result};
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm};
use tls12only_crypto_rustcrypto::RustCryptoProvider;

/// Client-specific configuration for TLS connections.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base TLS configuration
    pub config: Config,

    /// Trusted server certificates (DER-encoded, pinned by exact match)
    pub root_certificates: Vec<Vec<u8>>,

    /// Custom verifier; replaces pinning against `root_certificates`
    pub verifier: Option<Arc<dyn ServerCertVerifier>>,

    /// What to do when certificate verification fails
    pub auth_mode: AuthMode,

    /// Send SNI (Server Name Indication)
    pub enable_sni: bool,

    /// ALPN (Application-Layer Protocol Negotiation) protocols
    pub alpn_protocols: Vec<String>,

    /// Cipher suites, in preference order
    pub cipher_suites: Vec<CipherSuite>,

    /// Key exchange groups, in preference order
    pub groups: Vec<KeyExchangeAlgorithm>,

    /// Abort unless the server negotiates the extended master secret
    pub require_extended_master_secret: bool,

    /// Cryptographic backend
    pub provider: Arc<dyn CryptoProvider>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("config", &self.config)
            .field("root_certificates", &self.root_certificates.len())
            .field("verifier", &self.verifier)
            .field("auth_mode", &self.auth_mode)
            .field("enable_sni", &self.enable_sni)
            .field("alpn_protocols", &self.alpn_protocols)
            .field("cipher_suites", &self.cipher_suites)
            .field("groups", &self.groups)
            .field(
                "require_extended_master_secret",
                &self.require_extended_master_secret,
            )
            .finish_non_exhaustive()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
            root_certificates: Vec::new(),
            verifier: None,
            auth_mode: AuthMode::Required,
            enable_sni: true,
            alpn_protocols: Vec::new(),
            cipher_suites: default_cipher_suites(),
            groups: default_supported_groups(),
            require_extended_master_secret: false,
            provider: Arc::new(RustCryptoProvider::new()),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Handshake parameters for a connection to `server_name`.
    pub(crate) fn handshake_config(&self, server_name: &str) -> ClientHandshakeConfig {
        let verifier = self.verifier.clone().unwrap_or_else(|| {
            Arc::new(PinnedCertificateVerifier::new(self.root_certificates.clone()))
        });

        ClientHandshakeConfig {
            cipher_suites: self.cipher_suites.clone(),
            groups: self.groups.clone(),
            alpn_protocols: self
                .alpn_protocols
                .iter()
                .map(|p| p.as_bytes().to_vec())
                .collect(),
            server_name: (self.enable_sni && !server_name.is_empty())
                .then(|| server_name.to_string()),
            verifier,
            auth_mode: self.auth_mode,
            require_extended_master_secret: self.require_extended_master_secret,
            ..Default::default()
        }
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base: ConfigBuilder,
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set protocol versions.
    pub fn with_protocol_versions(mut self, versions: &[ProtocolVersion]) -> Self {
        self.base = self.base.with_protocol_versions(versions);
        self
    }

    /// Set maximum fragment length for outgoing records.
    pub fn with_max_fragment_length(mut self, length: u16) -> Self {
        self.base = self.base.with_max_fragment_length(length);
        self
    }

    /// Add a trusted server certificate (DER-encoded).
    pub fn add_root_certificate(mut self, cert: Vec<u8>) -> Self {
        self.config.root_certificates.push(cert);
        self
    }

    /// Set trusted server certificates (DER-encoded).
    pub fn with_root_certificates(mut self, certs: Vec<Vec<u8>>) -> Self {
        self.config.root_certificates = certs;
        self
    }

    /// Use a custom certificate verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn ServerCertVerifier>) -> Self {
        self.config.verifier = Some(verifier);
        self
    }

    /// Set the certificate verification mode.
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.config.auth_mode = mode;
        self
    }

    /// Enable or disable SNI.
    pub fn with_sni(mut self, enable: bool) -> Self {
        self.config.enable_sni = enable;
        self
    }

    /// Set ALPN protocols.
    pub fn with_alpn_protocols(mut self, protocols: Vec<String>) -> Self {
        self.config.alpn_protocols = protocols;
        self
    }

    /// Set cipher suites, in preference order.
    pub fn with_cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.config.cipher_suites = suites.to_vec();
        self
    }

    /// Set key exchange groups, in preference order.
    pub fn with_groups(mut self, groups: &[KeyExchangeAlgorithm]) -> Self {
        self.config.groups = groups.to_vec();
        self
    }

    /// Require the extended master secret.
    pub fn with_extended_master_secret_required(mut self, require: bool) -> Self {
        self.config.require_extended_master_secret = require;
        self
    }

    /// Use a different cryptographic backend.
    pub fn with_crypto_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.config.provider = provider;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let mut config = self.config;
        config.config = self.base.build()?;

        if config.auth_mode != AuthMode::None
            && config.verifier.is_none()
            && config.root_certificates.is_empty()
        {
            return Err(Error::InvalidConfig(
                "Server certificate verification enabled but no root certificates provided".into(),
            ));
        }

        if config.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("No cipher suites configured".into()));
        }

        if config.groups.is_empty() {
            return Err(Error::InvalidConfig("No key exchange groups configured".into()));
        }

        if config
            .alpn_protocols
            .iter()
            .any(|p| p.is_empty() || p.len() > 255)
        {
            return Err(Error::InvalidConfig(
                "ALPN protocol names must be 1 to 255 bytes".into(),
            ));
        }

        Ok(config)
    }
}
