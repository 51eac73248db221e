//! CertificateRequest message (RFC 5246 Section 7.4.4).
//!
//! Client authentication is not supported; the message is parsed so the
//! client can answer with an empty Certificate.

use super::{expect_end, read_vec_u16, read_vec_u8};
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// `ClientCertificateType.ecdsa_sign`.
pub const CERTIFICATE_TYPE_ECDSA_SIGN: u8 = 64;

/// CertificateRequest message.
///
/// ```text
/// struct {
///     ClientCertificateType certificate_types<1..2^8-1>;
///     SignatureAndHashAlgorithm supported_signature_algorithms<2..2^16-2>;
///     DistinguishedName certificate_authorities<0..2^16-1>;
/// } CertificateRequest;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Acceptable certificate types
    pub certificate_types: Vec<u8>,
    /// Acceptable signature algorithms, raw
    pub signature_algorithms: Vec<u16>,
    /// Encoded list of acceptable CA names, kept opaque
    pub certificate_authorities: Vec<u8>,
}

impl CertificateRequest {
    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.certificate_types.is_empty() || self.certificate_types.len() > 255 {
            return Err(Error::InvalidMessage("Invalid certificate_types length".into()));
        }

        let mut buf = BytesMut::new();
        buf.put_u8(self.certificate_types.len() as u8);
        buf.put_slice(&self.certificate_types);
        buf.put_u16((self.signature_algorithms.len() * 2) as u16);
        for alg in &self.signature_algorithms {
            buf.put_u16(*alg);
        }
        buf.put_u16(self.certificate_authorities.len() as u16);
        buf.put_slice(&self.certificate_authorities);
        Ok(buf.to_vec())
    }

    /// Decode the body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let certificate_types = read_vec_u8(&mut data, "certificate_types")?;
        if certificate_types.is_empty() {
            return Err(Error::InvalidMessage("Empty certificate_types".into()));
        }

        let algorithms = read_vec_u16(&mut data, "supported_signature_algorithms")?;
        if algorithms.len() % 2 != 0 {
            return Err(Error::InvalidMessage(
                "Odd supported_signature_algorithms length".into(),
            ));
        }

        let certificate_authorities = read_vec_u16(&mut data, "certificate_authorities")?;
        expect_end(data, "CertificateRequest")?;

        Ok(Self {
            certificate_types: certificate_types.to_vec(),
            signature_algorithms: algorithms
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect(),
            certificate_authorities: certificate_authorities.to_vec(),
        })
    }
}
