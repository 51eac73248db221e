//! AEAD (Authenticated Encryption with Associated Data) cipher interface.

use crate::Result;

/// AEAD cipher algorithms usable by TLS 1.2 AEAD cipher suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-128-GCM (RFC 5288)
    Aes128Gcm,

    /// AES-256-GCM (RFC 5288)
    Aes256Gcm,

    /// ChaCha20-Poly1305 (RFC 7905)
    ChaCha20Poly1305,
}

impl AeadAlgorithm {
    /// Get the key size in bytes for this algorithm.
    pub const fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm => 16,
            AeadAlgorithm::Aes256Gcm | AeadAlgorithm::ChaCha20Poly1305 => 32,
        }
    }

    /// Get the nonce size in bytes for this algorithm.
    pub const fn nonce_size(self) -> usize {
        12
    }

    /// Get the authentication tag size in bytes for this algorithm.
    pub const fn tag_size(self) -> usize {
        16
    }

    /// Get the name of this algorithm as used in TLS.
    pub const fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES_128_GCM",
            AeadAlgorithm::Aes256Gcm => "AES_256_GCM",
            AeadAlgorithm::ChaCha20Poly1305 => "CHACHA20_POLY1305",
        }
    }
}

/// AEAD cipher trait.
///
/// # Security Requirements
///
/// - Tag verification MUST be constant-time
/// - Nonces MUST NOT be reused with the same key
///
/// # Example
///
/// ```rust,no_run
/// use tls12only_crypto::Aead;
///
/// fn encrypt_example(aead: &dyn Aead) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
///     let key = &[0u8; 16];
///     let nonce = &[0u8; 12];
///     let ciphertext = aead.seal(key, nonce, b"additional data", b"secret message")?;
///     Ok(ciphertext)
/// }
/// ```
pub trait Aead: Send + Sync {
    /// Encrypt and authenticate plaintext.
    ///
    /// Returns the ciphertext with the authentication tag appended.
    ///
    /// # Errors
    ///
    /// - `InvalidKeySize` if key size doesn't match
    /// - `InvalidNonceSize` if nonce size doesn't match
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify ciphertext (tag appended).
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the tag does not verify
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm identifier.
    fn algorithm(&self) -> AeadAlgorithm;
}
