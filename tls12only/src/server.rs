//! TLS server configuration.

use std::sync::Arc;
use tls12only_core::certificate::extract_public_key;
use tls12only_core::cipher_suites::default_cipher_suites;
use tls12only_core::extensions::default_supported_groups;
use tls12only_core::handshake::ServerHandshakeConfig;
use tls12only_core::{CipherSuite, Config, ConfigBuilder, Error, ProtocolVersion, Result};
use tls12only_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureAlgorithm, SigningKey};
use tls12only_crypto_rustcrypto::RustCryptoProvider;

const P256_SCALAR_LENGTH: usize = 32;

/// Server-specific configuration for TLS connections.
#[derive(Clone)]
pub struct ServerConfig {
    /// Base TLS configuration
    pub config: Config,

    /// Server certificate chain (DER-encoded, leaf first)
    pub certificate_chain: Vec<Vec<u8>>,

    /// Server private key (raw P-256 scalar)
    pub private_key: SigningKey,

    /// ALPN (Application-Layer Protocol Negotiation) protocols, in
    /// preference order
    pub alpn_protocols: Vec<String>,

    /// Cipher suites, in preference order
    pub cipher_suites: Vec<CipherSuite>,

    /// Key exchange groups, in preference order
    pub groups: Vec<KeyExchangeAlgorithm>,

    /// Refuse clients without extended master secret support
    pub require_extended_master_secret: bool,

    /// Cryptographic backend
    pub provider: Arc<dyn CryptoProvider>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("config", &self.config)
            .field("certificate_chain", &self.certificate_chain.len())
            .field("private_key", &self.private_key)
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

impl ServerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    pub(crate) fn handshake_config(&self) -> ServerHandshakeConfig {
        ServerHandshakeConfig {
            cipher_suites: self.cipher_suites.clone(),
            groups: self.groups.clone(),
            alpn_protocols: self
                .alpn_protocols
                .iter()
                .map(|p| p.as_bytes().to_vec())
                .collect(),
            require_extended_master_secret: self.require_extended_master_secret,
            ..ServerHandshakeConfig::new(self.certificate_chain.clone(), self.private_key.clone())
        }
    }
}

/// Builder for server configuration.
#[derive(Default)]
pub struct ServerConfigBuilder {
    base: ConfigBuilder,
    certificate_chain: Option<Vec<Vec<u8>>>,
    private_key: Option<Vec<u8>>,
    alpn_protocols: Vec<String>,
    cipher_suites: Option<Vec<CipherSuite>>,
    groups: Option<Vec<KeyExchangeAlgorithm>>,
    require_extended_master_secret: bool,
    provider: Option<Arc<dyn CryptoProvider>>,
}

impl std::fmt::Debug for ServerConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfigBuilder")
            .field("base", &self.base)
            .field("alpn_protocols", &self.alpn_protocols)
            .field("cipher_suites", &self.cipher_suites)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

impl ServerConfigBuilder {
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

    /// Set server certificate chain.
    pub fn with_certificate_chain(mut self, chain: Vec<Vec<u8>>) -> Self {
        self.certificate_chain = Some(chain);
        self
    }

    /// Set server private key (raw 32-byte P-256 scalar).
    pub fn with_private_key(mut self, key: Vec<u8>) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Set ALPN protocols.
    pub fn with_alpn_protocols(mut self, protocols: Vec<String>) -> Self {
        self.alpn_protocols = protocols;
        self
    }

    /// Set cipher suites, in preference order.
    pub fn with_cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.cipher_suites = Some(suites.to_vec());
        self
    }

    /// Set key exchange groups, in preference order.
    pub fn with_groups(mut self, groups: &[KeyExchangeAlgorithm]) -> Self {
        self.groups = Some(groups.to_vec());
        self
    }

    /// Require the extended master secret.
    pub fn with_extended_master_secret_required(mut self, require: bool) -> Self {
        self.require_extended_master_secret = require;
        self
    }

    /// Use a different cryptographic backend.
    pub fn with_crypto_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the server configuration.
    ///
    /// Fails unless the private key matches the leaf certificate.
    pub fn build(self) -> Result<ServerConfig> {
        let config = self.base.build()?;

        let certificate_chain = self
            .certificate_chain
            .ok_or_else(|| Error::InvalidConfig("Certificate chain not set".into()))?;

        let private_key = self
            .private_key
            .ok_or_else(|| Error::InvalidConfig("Private key not set".into()))?;

        let leaf = certificate_chain
            .first()
            .ok_or_else(|| Error::InvalidConfig("Certificate chain is empty".into()))?;

        if private_key.len() != P256_SCALAR_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "Private key must be a {}-byte P-256 scalar, got {} bytes",
                P256_SCALAR_LENGTH,
                private_key.len()
            )));
        }

        let public_key = extract_public_key(leaf)
            .map_err(|e| Error::InvalidConfig(format!("Unusable leaf certificate: {}", e)))?;

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(RustCryptoProvider::new()));
        let private_key = SigningKey::from_bytes(private_key);
        check_key_pair(provider.as_ref(), &private_key, &public_key.key_bytes)?;

        let cipher_suites = self.cipher_suites.unwrap_or_else(default_cipher_suites);
        if cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("No cipher suites configured".into()));
        }
        let groups = self.groups.unwrap_or_else(default_supported_groups);
        if groups.is_empty() {
            return Err(Error::InvalidConfig("No key exchange groups configured".into()));
        }

        Ok(ServerConfig {
            config,
            certificate_chain,
            private_key,
            alpn_protocols: self.alpn_protocols,
            cipher_suites,
            groups,
            require_extended_master_secret: self.require_extended_master_secret,
            provider,
        })
    }
}

/// Sign a probe message and verify it against the certificate key.
fn check_key_pair(
    provider: &dyn CryptoProvider,
    private_key: &SigningKey,
    public_key: &[u8],
) -> Result<()> {
    const PROBE: &[u8] = b"tls12only key pair check";

    let scheme = provider.signature(SignatureAlgorithm::EcdsaSecp256r1Sha256)?;
    let signature = scheme
        .sign(private_key, PROBE)
        .map_err(|e| Error::InvalidConfig(format!("Invalid private key: {}", e)))?;
    scheme
        .verify(public_key, PROBE, &signature)
        .map_err(|_| Error::InvalidConfig("Private key does not match the certificate".into()))
}
