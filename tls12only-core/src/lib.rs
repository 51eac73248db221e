//! # tls12only core
//!
//! A TLS handshake and record-layer engine built for exactly one protocol
//! version: TLS 1.2. TLS 1.3 wire values are recognised so that a TLS 1.3
//! peer is refused cleanly with a `protocol_version` alert, never
//! negotiated.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Public API (tls12only)              │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     tls12only-core (this crate)         │
//! │  ┌──────────────────────────────────┐   │
//! │  │   Handshake state machines       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Version negotiation            │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Messages and extensions        │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   PRF and record protection      │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   tls12only-crypto (trait interface)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Enabled versions
//!
//! The protocol feature set is the constant
//! [`protocol::ENABLED_PROTOCOL_VERSIONS`]. Every configuration passes
//! through [`ConfigBuilder::build`], which rejects anything outside it.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use tls12only_crypto;

pub mod alert;
pub mod certificate;
pub mod cipher_suites;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod handshake_io;
pub mod key_exchange;
pub mod messages;
pub mod prf;
pub mod protocol;
pub mod record;
pub mod record_protection;
pub mod transcript;
pub mod version;

pub use cipher_suites::CipherSuite;
pub use error::{AlertDescription, Error, ProtocolError, Result};
pub use protocol::{ContentType, ProtocolVersion, ENABLED_PROTOCOL_VERSIONS};

/// Protocol-level configuration shared by clients and servers.
///
/// # Example
///
/// ```rust
/// use tls12only_core::{Config, ProtocolVersion};
///
/// let config = Config::builder()
///     .with_protocol_versions(&[ProtocolVersion::Tls12])
///     .build()
///     .unwrap();
/// assert_eq!(config.protocol_versions, vec![ProtocolVersion::Tls12]);
///
/// // TLS 1.3 is not part of this build
/// assert!(Config::builder()
///     .with_protocol_versions(&[ProtocolVersion::Tls13])
///     .build()
///     .is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Protocol versions to negotiate
    pub protocol_versions: Vec<ProtocolVersion>,

    /// Maximum plaintext fragment length (default: 16384)
    pub max_fragment_length: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol_versions: ENABLED_PROTOCOL_VERSIONS.to_vec(),
            max_fragment_length: record::MAX_FRAGMENT_SIZE as u16,
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set protocol versions.
    pub fn with_protocol_versions(mut self, versions: &[ProtocolVersion]) -> Self {
        self.config.protocol_versions = versions.to_vec();
        self
    }

    /// Set maximum fragment length.
    pub fn with_max_fragment_length(mut self, length: u16) -> Self {
        self.config.max_fragment_length = length;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        if self.config.protocol_versions.is_empty() {
            return Err(Error::InvalidConfig(
                "No protocol versions specified".into(),
            ));
        }

        if let Some(version) = self
            .config
            .protocol_versions
            .iter()
            .find(|v| !v.is_enabled())
        {
            return Err(Error::UnsupportedFeature(format!(
                "{} is not enabled in this build",
                version
            )));
        }

        if self.config.max_fragment_length == 0
            || self.config.max_fragment_length as usize > record::MAX_FRAGMENT_SIZE
        {
            return Err(Error::InvalidConfig(format!(
                "Max fragment length must be 1..={}",
                record::MAX_FRAGMENT_SIZE
            )));
        }

        Ok(self.config)
    }
}
