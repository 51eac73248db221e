//! Server certificate handling.
//!
//! This is not an X.509 path validator. The engine needs two things from
//! the server's certificate: the public key that verifies the
//! ServerKeyExchange signature, and a trust decision. The first is read by
//! walking the DER structure of the TBSCertificate in field order; the
//! second is delegated to a [`ServerCertVerifier`].

use crate::error::{Error, ProtocolError, Result};
use subtle::ConstantTimeEq;
use tls12only_crypto::SignatureAlgorithm;
use tracing::{debug, warn};

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_EXPLICIT_VERSION: u8 = 0xA0;

/// id-ecPublicKey (1.2.840.10045.2.1)
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];

/// prime256v1 (1.2.840.10045.3.1.7)
const OID_PRIME256V1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];

/// Public key extracted from a certificate's SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPublicKey {
    /// Signature scheme the key is usable with
    pub algorithm: SignatureAlgorithm,
    /// SEC1 uncompressed point
    pub key_bytes: Vec<u8>,
}

struct DerReader<'a> {
    data: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Read one TLV, returning its tag and contents.
    fn read_any(&mut self) -> Result<(u8, &'a [u8])> {
        let (&tag, rest) = self.data.split_first().ok_or_else(|| malformed("truncated tag"))?;
        let (&first, mut rest) = rest.split_first().ok_or_else(|| malformed("truncated length"))?;

        let length = if first < 0x80 {
            first as usize
        } else {
            let count = (first & 0x7F) as usize;
            if count == 0 || count > 3 || rest.len() < count {
                return Err(malformed("unsupported length encoding"));
            }
            let (bytes, tail) = rest.split_at(count);
            rest = tail;
            bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize)
        };

        if rest.len() < length {
            return Err(malformed("element overruns its container"));
        }
        let (contents, tail) = rest.split_at(length);
        self.data = tail;
        Ok((tag, contents))
    }

    fn read(&mut self, expected: u8) -> Result<&'a [u8]> {
        let (tag, contents) = self.read_any()?;
        if tag != expected {
            return Err(malformed(&format!(
                "expected tag {:#04x}, found {:#04x}",
                expected, tag
            )));
        }
        Ok(contents)
    }
}

fn malformed(what: &str) -> Error {
    Error::CertificateVerificationFailed(format!("Malformed certificate: {}", what))
}

/// Extract the subject public key from a DER certificate.
///
/// ```text
/// Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signatureValue }
/// TBSCertificate ::= SEQUENCE {
///     version [0] EXPLICIT OPTIONAL, serialNumber, signature,
///     issuer, validity, subject, subjectPublicKeyInfo, ... }
/// ```
///
/// Only id-ecPublicKey keys on prime256v1 are accepted; anything else
/// fails with `unsupported_certificate`.
pub fn extract_public_key(cert_der: &[u8]) -> Result<SubjectPublicKey> {
    let mut outer = DerReader::new(cert_der);
    let certificate = outer.read(TAG_SEQUENCE)?;
    if !outer.data.is_empty() {
        return Err(malformed("trailing data"));
    }

    let mut tbs = DerReader::new(DerReader::new(certificate).read(TAG_SEQUENCE)?);
    if tbs.peek_tag() == Some(TAG_EXPLICIT_VERSION) {
        tbs.read_any()?;
    }
    tbs.read(TAG_INTEGER)?; // serialNumber
    tbs.read(TAG_SEQUENCE)?; // signature
    tbs.read(TAG_SEQUENCE)?; // issuer
    tbs.read(TAG_SEQUENCE)?; // validity
    tbs.read(TAG_SEQUENCE)?; // subject

    let mut spki = DerReader::new(tbs.read(TAG_SEQUENCE)?);
    let mut algorithm = DerReader::new(spki.read(TAG_SEQUENCE)?);
    let key_oid = algorithm.read(TAG_OID)?;
    if key_oid != OID_EC_PUBLIC_KEY {
        debug!("Certificate key is not an EC public key");
        return Err(Error::ProtocolError(ProtocolError::UnsupportedCertificate));
    }
    if algorithm.peek_tag() != Some(TAG_OID) || algorithm.read(TAG_OID)? != OID_PRIME256V1 {
        debug!("Certificate EC key is not on prime256v1");
        return Err(Error::ProtocolError(ProtocolError::UnsupportedCertificate));
    }

    let bits = spki.read(TAG_BIT_STRING)?;
    match bits.split_first() {
        Some((0, point)) if point.len() == 65 && point[0] == 0x04 => Ok(SubjectPublicKey {
            algorithm: SignatureAlgorithm::EcdsaSecp256r1Sha256,
            key_bytes: point.to_vec(),
        }),
        _ => Err(malformed("subjectPublicKey is not an uncompressed P-256 point")),
    }
}

/// How the client treats a failed certificate verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Abort the handshake with `bad_certificate`
    #[default]
    Required,
    /// Record the failure and continue
    Optional,
    /// Do not consult the verifier
    None,
}

/// Outcome of server certificate verification, kept on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The verifier accepted the chain
    Verified,
    /// Verification was not performed ([`AuthMode::None`])
    Skipped,
    /// Verification failed under [`AuthMode::Optional`]
    Failed(String),
}

/// Decides whether a server's certificate chain is trusted.
pub trait ServerCertVerifier: Send + Sync + std::fmt::Debug {
    /// Verify `chain` (leaf first) for `server_name`.
    fn verify_server_certificate(&self, chain: &[Vec<u8>], server_name: Option<&str>) -> Result<()>;
}

/// Trusts exactly the configured end-entity certificates.
#[derive(Debug, Clone, Default)]
pub struct PinnedCertificateVerifier {
    trusted: Vec<Vec<u8>>,
}

impl PinnedCertificateVerifier {
    /// Create a verifier trusting the given DER certificates.
    pub fn new(trusted: Vec<Vec<u8>>) -> Self {
        Self { trusted }
    }

    /// Add a trusted DER certificate.
    pub fn with_certificate(mut self, cert_der: Vec<u8>) -> Self {
        self.trusted.push(cert_der);
        self
    }
}

impl ServerCertVerifier for PinnedCertificateVerifier {
    fn verify_server_certificate(
        &self,
        chain: &[Vec<u8>],
        _server_name: Option<&str>,
    ) -> Result<()> {
        let leaf = chain.first().ok_or_else(|| {
            Error::CertificateVerificationFailed("Server sent no certificate".into())
        })?;

        if self
            .trusted
            .iter()
            .any(|pinned| bool::from(pinned.as_slice().ct_eq(leaf.as_slice())))
        {
            Ok(())
        } else {
            Err(Error::CertificateVerificationFailed(
                "Server certificate is not pinned".into(),
            ))
        }
    }
}

/// Accepts any certificate. Only for tests and closed environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_certificate(
        &self,
        _chain: &[Vec<u8>],
        _server_name: Option<&str>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Run `verifier` under `mode`.
///
/// Under [`AuthMode::Required`] a failure is returned as an error; under
/// [`AuthMode::Optional`] it is logged and reported in the result.
pub fn verify_with_mode(
    verifier: &dyn ServerCertVerifier,
    mode: AuthMode,
    chain: &[Vec<u8>],
    server_name: Option<&str>,
) -> Result<VerificationResult> {
    match mode {
        AuthMode::None => Ok(VerificationResult::Skipped),
        AuthMode::Required => {
            verifier.verify_server_certificate(chain, server_name)?;
            Ok(VerificationResult::Verified)
        },
        AuthMode::Optional => match verifier.verify_server_certificate(chain, server_name) {
            Ok(()) => Ok(VerificationResult::Verified),
            Err(e) => {
                warn!(error = %e, "Server certificate verification failed; continuing");
                Ok(VerificationResult::Failed(e.to_string()))
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_CERT: &[u8] = include_bytes!("../../testdata/server.der");
    const OTHER_CERT: &[u8] = include_bytes!("../../testdata/other.der");

    #[test]
    fn test_extract_p256_key() {
        let key = extract_public_key(SERVER_CERT).unwrap();
        assert_eq!(key.algorithm, SignatureAlgorithm::EcdsaSecp256r1Sha256);
        assert_eq!(
            hex::encode(&key.key_bytes),
            "04d531931598b7d18be99c0edad3a80b3d81b43e87076e32b992ceabc9f37b3b65\
             0599c7430c58eb376c9e75c7b479dd31073a430105c549483b137167d655a072"
        );

        assert_ne!(extract_public_key(OTHER_CERT).unwrap(), key);
    }

    #[test]
    fn test_malformed_certificates() {
        assert!(extract_public_key(&[]).is_err());
        assert!(extract_public_key(&SERVER_CERT[..100]).is_err());

        let mut trailing = SERVER_CERT.to_vec();
        trailing.push(0);
        assert!(extract_public_key(&trailing).is_err());
    }

    #[test]
    fn test_unsupported_key_type() {
        // Corrupt the last arc of id-ecPublicKey
        let mut cert = SERVER_CERT.to_vec();
        let pos = cert
            .windows(OID_EC_PUBLIC_KEY.len())
            .position(|w| w == OID_EC_PUBLIC_KEY)
            .unwrap();
        cert[pos + 6] = 0x02;

        assert_eq!(
            extract_public_key(&cert),
            Err(Error::ProtocolError(ProtocolError::UnsupportedCertificate))
        );
    }

    #[test]
    fn test_pinned_verifier() {
        let verifier = PinnedCertificateVerifier::new(vec![SERVER_CERT.to_vec()]);
        assert!(verifier
            .verify_server_certificate(&[SERVER_CERT.to_vec()], Some("localhost"))
            .is_ok());
        assert!(verifier
            .verify_server_certificate(&[OTHER_CERT.to_vec()], Some("localhost"))
            .is_err());
        assert!(verifier.verify_server_certificate(&[], None).is_err());
    }

    #[test]
    fn test_auth_modes() {
        let verifier = PinnedCertificateVerifier::default().with_certificate(SERVER_CERT.to_vec());
        let chain = [OTHER_CERT.to_vec()];

        assert!(matches!(
            verify_with_mode(&verifier, AuthMode::Required, &chain, None),
            Err(Error::CertificateVerificationFailed(_))
        ));
        assert!(matches!(
            verify_with_mode(&verifier, AuthMode::Optional, &chain, None),
            Ok(VerificationResult::Failed(_))
        ));
        assert_eq!(
            verify_with_mode(&verifier, AuthMode::None, &chain, None),
            Ok(VerificationResult::Skipped)
        );
        assert_eq!(
            verify_with_mode(&AcceptAnyCertificate, AuthMode::Required, &chain, None),
            Ok(VerificationResult::Verified)
        );
    }
}
