//! Certificate message (RFC 5246 Section 7.4.2).

use super::read_vec_u24;
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Largest value a 24-bit length can carry.
const MAX_U24: usize = 0xFF_FFFF;

/// Certificate message.
///
/// ```text
/// opaque ASN.1Cert<1..2^24-1>;
///
/// struct {
///     ASN.1Cert certificate_list<0..2^24-1>;
/// } Certificate;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateMessage {
    /// DER certificates, leaf first
    pub certificate_list: Vec<Vec<u8>>,
}

impl CertificateMessage {
    /// Create a Certificate message from a DER chain (leaf first).
    pub fn new(certificate_list: Vec<Vec<u8>>) -> Self {
        Self { certificate_list }
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certificate_list.first().map(Vec::as_slice)
    }

    /// Encode the Certificate body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut list = BytesMut::new();
        for cert in &self.certificate_list {
            if cert.is_empty() || cert.len() > MAX_U24 {
                return Err(Error::InvalidMessage("Invalid certificate length".into()));
            }
            list.put_uint(cert.len() as u64, 3);
            list.put_slice(cert);
        }
        if list.len() > MAX_U24 {
            return Err(Error::InvalidMessage("Certificate list too long".into()));
        }

        let mut buf = BytesMut::with_capacity(3 + list.len());
        buf.put_uint(list.len() as u64, 3);
        buf.put_slice(&list);
        Ok(buf.to_vec())
    }

    /// Decode a Certificate body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let mut list = read_vec_u24(&mut data, "certificate_list")?;
        if !data.is_empty() {
            return Err(Error::InvalidMessage(
                "Trailing bytes after certificate_list".into(),
            ));
        }

        let mut certificate_list = Vec::new();
        while !list.is_empty() {
            let cert = read_vec_u24(&mut list, "certificate")?;
            if cert.is_empty() {
                return Err(Error::InvalidMessage("Empty certificate".into()));
            }
            certificate_list.push(cert.to_vec());
        }

        Ok(Self { certificate_list })
    }
}
