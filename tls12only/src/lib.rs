//! # tls12only
//!
//! Blocking TLS 1.2 client and server streams over any
//! `std::io::Read + Write` transport.
//!
//! TLS 1.3 is not compiled in. Configurations that ask for it are rejected
//! by their builders, and a peer that insists on it is refused with a
//! `protocol_version` alert.
//!
//! ## Quick Start
//!
//! ### Client
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::io::{Read, Write};
//! use std::net::TcpStream;
//! use tls12only::{ClientConfig, TlsStream};
//!
//! let server_cert = std::fs::read("server.der")?;
//! let config = ClientConfig::builder()
//!     .add_root_certificate(server_cert)
//!     .with_alpn_protocols(vec!["http/1.1".to_string()])
//!     .build()?;
//!
//! let tcp = TcpStream::connect("localhost:8443")?;
//! let mut tls = TlsStream::connect(config, "localhost", tcp)?;
//! tls.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")?;
//!
//! let mut response = Vec::new();
//! tls.read_to_end(&mut response)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Server
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::net::TcpListener;
//! use tls12only::{ServerConfig, TlsStream};
//!
//! let config = ServerConfig::builder()
//!     .with_certificate_chain(vec![std::fs::read("server.der")?])
//!     .with_private_key(std::fs::read("server.key")?)
//!     .build()?;
//!
//! let listener = TcpListener::bind("0.0.0.0:8443")?;
//! for tcp in listener.incoming() {
//!     let tls = TlsStream::accept(config.clone(), tcp?)?;
//!     // Handle connection...
//! #   drop(tls);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Server private keys are raw 32-byte P-256 scalars.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tls12only_core::{
    self, error, protocol, AlertDescription, CipherSuite, Config, ContentType, Error,
    ProtocolError, ProtocolVersion, Result, ENABLED_PROTOCOL_VERSIONS,
};

pub use tls12only_core::certificate::{
    AcceptAnyCertificate, AuthMode, PinnedCertificateVerifier, ServerCertVerifier,
    VerificationResult,
};

// Re-export crypto interface
pub use tls12only_crypto;
pub use tls12only_crypto_rustcrypto::RustCryptoProvider;

// Public modules
pub mod client;
pub mod server;
pub mod stream;

// Re-exports
pub use client::ClientConfig;
pub use server::ServerConfig;
pub use stream::TlsStream;

/// tls12only version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the tls12only version.
pub fn version() -> &'static str {
    VERSION
}
