//! Digital signatures used to authenticate ServerKeyExchange.

use crate::Result;
use zeroize::Zeroize;

/// TLS 1.2 `SignatureAndHashAlgorithm` values (RFC 5246 Section 7.4.1.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-256 with SHA-256 (hash 4, signature 3)
    EcdsaSecp256r1Sha256,
}

impl SignatureAlgorithm {
    /// Get the IANA codepoint (hash byte, signature byte).
    pub const fn iana_codepoint(self) -> u16 {
        match self {
            SignatureAlgorithm::EcdsaSecp256r1Sha256 => 0x0403,
        }
    }

    /// Convert to wire format (u16).
    pub const fn to_u16(self) -> u16 {
        self.iana_codepoint()
    }

    /// Convert from wire format (u16).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0403 => Some(SignatureAlgorithm::EcdsaSecp256r1Sha256),
            _ => None,
        }
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaSecp256r1Sha256 => "ecdsa_secp256r1_sha256",
        }
    }
}

/// Signing key, zeroized on drop.
#[derive(Zeroize, Clone)]
#[zeroize(drop)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SigningKey {
    /// Create a signing key from raw scalar bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Verifying key (for ECDSA: the SEC1 uncompressed point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    bytes: Vec<u8>,
}

impl VerifyingKey {
    /// Create a verifying key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Signature scheme trait.
///
/// `message` is the unhashed signed content; the scheme applies its own hash.
pub trait Signature: Send + Sync {
    /// Sign a message.
    fn sign(&self, signing_key: &SigningKey, message: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature.
    ///
    /// # Errors
    ///
    /// `InvalidPublicKey`, `InvalidSignature` for malformed input and
    /// `SignatureVerificationFailed` when the signature does not match.
    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Generate a fresh key pair.
    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)>;

    /// Get the algorithm identifier.
    fn algorithm(&self) -> SignatureAlgorithm;
}
