//! ServerKeyExchange for ECDHE_ECDSA (RFC 8422 Section 5.4).

use super::{expect_end, read_u16, read_u8, read_vec_u16, read_vec_u8};
use crate::error::{Error, ProtocolError, Result};
use bytes::{BufMut, BytesMut};
use tls12only_crypto::KeyExchangeAlgorithm;

/// `ECCurveType.named_curve`.
pub const CURVE_TYPE_NAMED_CURVE: u8 = 3;

/// ServerKeyExchange message carrying signed ephemeral ECDH parameters.
///
/// ```text
/// struct {
///     ECParameters curve_params;   // curve_type(1) + named_curve(2)
///     ECPoint      public;         // opaque point <1..2^8-1>
/// } ServerECDHParams;
///
/// struct {
///     ServerECDHParams params;
///     digitally-signed struct {
///         opaque client_random[32];
///         opaque server_random[32];
///         ServerECDHParams params;
///     } signed_params;
/// } ServerKeyExchange;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    /// Named group of the ephemeral key
    pub group: KeyExchangeAlgorithm,

    /// Server ephemeral public key
    pub public_key: Vec<u8>,

    /// SignatureAndHashAlgorithm, raw
    pub signature_algorithm: u16,

    /// DER-encoded signature
    pub signature: Vec<u8>,
}

impl ServerKeyExchange {
    /// Encode the ServerECDHParams portion.
    pub fn params(group: KeyExchangeAlgorithm, public_key: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(4 + public_key.len());
        buf.put_u8(CURVE_TYPE_NAMED_CURVE);
        buf.put_u16(group.to_u16());
        buf.put_u8(public_key.len() as u8);
        buf.put_slice(public_key);
        buf.to_vec()
    }

    /// The byte string covered by the signature.
    pub fn signed_data(
        client_random: &[u8; 32],
        server_random: &[u8; 32],
        params: &[u8],
    ) -> Vec<u8> {
        let mut data = Vec::with_capacity(64 + params.len());
        data.extend_from_slice(client_random);
        data.extend_from_slice(server_random);
        data.extend_from_slice(params);
        data
    }

    /// The signed byte string for this message.
    pub fn signed_params(&self, client_random: &[u8; 32], server_random: &[u8; 32]) -> Vec<u8> {
        Self::signed_data(
            client_random,
            server_random,
            &Self::params(self.group, &self.public_key),
        )
    }

    /// Encode the ServerKeyExchange body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.public_key.is_empty() || self.public_key.len() > 255 {
            return Err(Error::InvalidMessage("Invalid ECDH public key length".into()));
        }
        if self.signature.len() > u16::MAX as usize {
            return Err(Error::InvalidMessage("Signature too long".into()));
        }

        let mut buf = BytesMut::new();
        buf.put_slice(&Self::params(self.group, &self.public_key));
        buf.put_u16(self.signature_algorithm);
        buf.put_u16(self.signature.len() as u16);
        buf.put_slice(&self.signature);
        Ok(buf.to_vec())
    }

    /// Decode a ServerKeyExchange body.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        let curve_type = read_u8(&mut data, "ServerKeyExchange curve_type")?;
        if curve_type != CURVE_TYPE_NAMED_CURVE {
            return Err(Error::ProtocolError(ProtocolError::IllegalParameter));
        }

        let named_curve = read_u16(&mut data, "ServerKeyExchange named_curve")?;
        let group = KeyExchangeAlgorithm::from_u16(named_curve)
            .ok_or(Error::ProtocolError(ProtocolError::IllegalParameter))?;

        let public_key = read_vec_u8(&mut data, "ServerKeyExchange public")?;
        if public_key.is_empty() {
            return Err(Error::InvalidMessage("Empty ECDH public key".into()));
        }

        let signature_algorithm = read_u16(&mut data, "ServerKeyExchange signature algorithm")?;
        let signature = read_vec_u16(&mut data, "ServerKeyExchange signature")?;
        expect_end(data, "ServerKeyExchange")?;

        Ok(Self {
            group,
            public_key: public_key.to_vec(),
            signature_algorithm,
            signature: signature.to_vec(),
        })
    }
}
