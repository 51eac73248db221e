//! Error types for the cryptographic provider.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested algorithm is not supported by this provider.
    #[error("Algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid key size for the algorithm.
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Invalid nonce/IV size for the algorithm.
    #[error("Invalid nonce size: expected {expected} bytes, got {actual}")]
    InvalidNonceSize {
        /// Expected nonce size in bytes
        expected: usize,
        /// Actual nonce size in bytes
        actual: usize,
    },

    /// Invalid length parameter.
    #[error("Invalid length parameter")]
    InvalidLength,

    /// Authentication tag verification failed (AEAD).
    #[error("Authentication tag verification failed")]
    AuthenticationFailed,

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature format.
    #[error("Invalid signature format")]
    InvalidSignature,

    /// Invalid public key.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key.
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Key exchange failed.
    #[error("Key exchange failed")]
    KeyExchangeFailed,

    /// Random number generation failed.
    #[error("Random number generation failed")]
    RandomGenerationFailed,

    /// General cryptographic error with a message.
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Internal error (should not happen in correct usage).
    #[error("Internal error: {0}")]
    Internal(String),
}
