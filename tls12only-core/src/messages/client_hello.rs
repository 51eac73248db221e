//! ClientHello message (RFC 5246 Section 7.4.1.2).

use super::{read_bytes, read_u16, read_vec_u16, read_vec_u8};
use crate::cipher_suites::CipherSuite;
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::protocol::ProtocolVersion;
use bytes::{BufMut, BytesMut};

/// ClientHello message.
///
/// ```text
/// struct {
///     ProtocolVersion client_version;
///     Random random;
///     SessionID session_id;
///     CipherSuite cipher_suites<2..2^16-2>;
///     CompressionMethod compression_methods<1..2^8-1>;
///     select (extensions_present) {
///         case false: struct {};
///         case true:  Extension extensions<0..2^16-1>;
///     };
/// } ClientHello;
/// ```
///
/// Versions and cipher suites are kept as raw wire values so that offers
/// from newer peers (TLS 1.3 suites, GREASE) survive decoding and can be
/// judged by the negotiation logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Highest version the client supports (0x0303 for TLS 1.2 and 1.3 clients)
    pub client_version: u16,

    /// Client random
    pub random: [u8; 32],

    /// Session ID (resumption is not supported; echoed length only)
    pub session_id: Vec<u8>,

    /// Offered cipher suites
    pub cipher_suites: Vec<u16>,

    /// Offered compression methods (must contain null)
    pub compression_methods: Vec<u8>,

    /// Extensions
    pub extensions: Extensions,
}

impl ClientHello {
    /// Create a TLS 1.2 ClientHello.
    pub fn new(random: [u8; 32], cipher_suites: &[CipherSuite]) -> Self {
        Self {
            client_version: ProtocolVersion::Tls12.to_u16(),
            random,
            session_id: Vec::new(),
            cipher_suites: cipher_suites.iter().map(|s| s.to_u16()).collect(),
            compression_methods: vec![0],
            extensions: Extensions::new(),
        }
    }

    /// Set the extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Offered suites this engine implements, in client preference order.
    pub fn offered_suites(&self) -> Vec<CipherSuite> {
        self.cipher_suites
            .iter()
            .copied()
            .filter_map(CipherSuite::from_u16)
            .collect()
    }

    /// Whether the raw suite value is in the offer.
    pub fn offers(&self, suite: u16) -> bool {
        self.cipher_suites.contains(&suite)
    }

    /// Encode the ClientHello body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.session_id.len() > 32 {
            return Err(Error::InvalidMessage("Session ID too long".into()));
        }
        if self.cipher_suites.is_empty() || self.cipher_suites.len() > 32767 {
            return Err(Error::InvalidMessage("Invalid cipher suite count".into()));
        }
        if self.compression_methods.is_empty() || self.compression_methods.len() > 255 {
            return Err(Error::InvalidMessage(
                "Invalid compression methods length".into(),
            ));
        }

        let mut buf = BytesMut::new();
        buf.put_u16(self.client_version);
        buf.put_slice(&self.random);
        buf.put_u8(self.session_id.len() as u8);
        buf.put_slice(&self.session_id);
        buf.put_u16((self.cipher_suites.len() * 2) as u16);
        for suite in &self.cipher_suites {
            buf.put_u16(*suite);
        }
        buf.put_u8(self.compression_methods.len() as u8);
        buf.put_slice(&self.compression_methods);
        buf.put_slice(&self.extensions.encode());
        Ok(buf.to_vec())
    }

    /// Decode a ClientHello body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let client_version = read_u16(&mut data, "ClientHello version")?;

        let mut random = [0u8; 32];
        random.copy_from_slice(read_bytes(&mut data, 32, "ClientHello random")?);

        let session_id = read_vec_u8(&mut data, "ClientHello session_id")?;
        if session_id.len() > 32 {
            return Err(Error::InvalidMessage("Session ID too long".into()));
        }

        let suites = read_vec_u16(&mut data, "ClientHello cipher_suites")?;
        if suites.is_empty() || suites.len() % 2 != 0 {
            return Err(Error::InvalidMessage("Invalid cipher suites length".into()));
        }
        let cipher_suites = suites
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();

        let compression_methods = read_vec_u8(&mut data, "ClientHello compression_methods")?;
        if compression_methods.is_empty() {
            return Err(Error::InvalidMessage("Empty compression methods".into()));
        }

        // The extension block is optional in TLS 1.2
        let extensions = if data.is_empty() {
            Extensions::new()
        } else {
            Extensions::decode(data)?
        };

        Ok(Self {
            client_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suites,
            compression_methods: compression_methods.to_vec(),
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suites::default_cipher_suites;
    use crate::extensions::extended_master_secret_extension;

    #[test]
    fn test_client_hello_encode_decode() {
        let mut extensions = Extensions::new();
        extensions.add(extended_master_secret_extension());
        let hello =
            ClientHello::new([0x42; 32], &default_cipher_suites()).with_extensions(extensions);

        let encoded = hello.encode().unwrap();
        assert_eq!(&encoded[..2], &[0x03, 0x03]);

        let decoded = ClientHello::decode(&encoded).unwrap();
        assert_eq!(decoded, hello);
        assert_eq!(decoded.offered_suites(), default_cipher_suites());
    }

    #[test]
    fn test_unknown_suites_survive_decoding() {
        let mut hello = ClientHello::new([0u8; 32], &[CipherSuite::EcdheEcdsaWithAes128GcmSha256]);
        hello.cipher_suites.insert(0, 0x1301);

        let decoded = ClientHello::decode(&hello.encode().unwrap()).unwrap();
        assert!(decoded.offers(0x1301));
        assert_eq!(
            decoded.offered_suites(),
            vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]
        );
    }

    #[test]
    fn test_client_hello_without_extensions() {
        let hello = ClientHello::new([7u8; 32], &[CipherSuite::EcdheEcdsaWithAes128GcmSha256]);
        let mut encoded = hello.encode().unwrap();
        // Drop the empty extension block entirely
        encoded.truncate(encoded.len() - 2);

        let decoded = ClientHello::decode(&encoded).unwrap();
        assert!(decoded.extensions.is_empty());
    }

    #[test]
    fn test_client_hello_invalid() {
        assert!(ClientHello::decode(&[1, 2, 3]).is_err());

        let mut data = vec![0x03, 0x03];
        data.extend_from_slice(&[0u8; 32]);
        data.push(33);
        data.extend_from_slice(&[0u8; 33]);
        assert!(ClientHello::decode(&data).is_err());
    }
}
