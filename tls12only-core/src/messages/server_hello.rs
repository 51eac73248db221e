//! ServerHello message (RFC 5246 Section 7.4.1.3).

use super::{read_bytes, read_u16, read_u8, read_vec_u8};
use crate::cipher_suites::CipherSuite;
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::protocol::ProtocolVersion;
use bytes::{BufMut, BytesMut};

/// ServerHello message.
///
/// ```text
/// struct {
///     ProtocolVersion server_version;
///     Random random;
///     SessionID session_id;
///     CipherSuite cipher_suite;
///     CompressionMethod compression_method;
///     select (extensions_present) {
///         case false: struct {};
///         case true:  Extension extensions<0..2^16-1>;
///     };
/// } ServerHello;
/// ```
///
/// The version and suite are raw values: a TLS 1.3 ServerHello (or
/// HelloRetryRequest) decodes cleanly so the client can refuse it with
/// `protocol_version` rather than a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Selected version
    pub server_version: u16,

    /// Server random
    pub random: [u8; 32],

    /// Session ID
    pub session_id: Vec<u8>,

    /// Selected cipher suite
    pub cipher_suite: u16,

    /// Selected compression method
    pub compression_method: u8,

    /// Extensions
    pub extensions: Extensions,
}

impl ServerHello {
    /// Create a TLS 1.2 ServerHello.
    pub fn new(random: [u8; 32], cipher_suite: CipherSuite) -> Self {
        Self {
            server_version: ProtocolVersion::Tls12.to_u16(),
            random,
            session_id: Vec::new(),
            cipher_suite: cipher_suite.to_u16(),
            compression_method: 0,
            extensions: Extensions::new(),
        }
    }

    /// Set the extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set the session ID.
    pub fn with_session_id(mut self, session_id: Vec<u8>) -> Self {
        self.session_id = session_id;
        self
    }

    /// The selected suite, if it is one this engine implements.
    pub fn suite(&self) -> Option<CipherSuite> {
        CipherSuite::from_u16(self.cipher_suite)
    }

    /// Encode the ServerHello body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.session_id.len() > 32 {
            return Err(Error::InvalidMessage("Session ID too long".into()));
        }

        let mut buf = BytesMut::new();
        buf.put_u16(self.server_version);
        buf.put_slice(&self.random);
        buf.put_u8(self.session_id.len() as u8);
        buf.put_slice(&self.session_id);
        buf.put_u16(self.cipher_suite);
        buf.put_u8(self.compression_method);
        if !self.extensions.is_empty() {
            buf.put_slice(&self.extensions.encode());
        }
        Ok(buf.to_vec())
    }

    /// Decode a ServerHello body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let server_version = read_u16(&mut data, "ServerHello version")?;

        let mut random = [0u8; 32];
        random.copy_from_slice(read_bytes(&mut data, 32, "ServerHello random")?);

        let session_id = read_vec_u8(&mut data, "ServerHello session_id")?;
        if session_id.len() > 32 {
            return Err(Error::InvalidMessage("Session ID too long".into()));
        }

        let cipher_suite = read_u16(&mut data, "ServerHello cipher_suite")?;
        let compression_method = read_u8(&mut data, "ServerHello compression_method")?;

        let extensions = if data.is_empty() {
            Extensions::new()
        } else {
            Extensions::decode(data)?
        };

        Ok(Self {
            server_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suite,
            compression_method,
            extensions,
        })
    }
}
