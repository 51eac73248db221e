//! # RustCrypto provider for tls12only
//!
//! Implements [`tls12only_crypto::CryptoProvider`] on top of the RustCrypto
//! crates.
//!
//! ## Supported Algorithms
//!
//! - **AEAD**: AES-128-GCM, AES-256-GCM (`aes-gcm`), ChaCha20-Poly1305 (`chacha20poly1305`)
//! - **Hash / HMAC**: SHA-256, SHA-384 (`sha2`, `hmac`)
//! - **PRF**: TLS 1.2 P_SHA256, P_SHA384
//! - **Key Exchange**: X25519 (`x25519-dalek`), ECDH P-256 (`p256`)
//! - **Signatures**: ECDSA P-256 with SHA-256 (`p256`)
//! - **RNG**: OS entropy through `rand_core::OsRng`
//!
//! ```rust,no_run
//! use tls12only_crypto::CryptoProvider;
//! use tls12only_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use tls12only_crypto::{
    Aead, AeadAlgorithm, CryptoProvider, Hash, HashAlgorithm, Hmac, Kdf, KdfAlgorithm,
    KeyExchange, KeyExchangeAlgorithm, Random, Result, Signature, SignatureAlgorithm,
};

pub mod aead;
pub mod hash;
pub mod hmac;
pub mod kex;
pub mod prf;
pub mod random;
pub mod signature;

use random::OsRandom;

/// Cryptography provider using RustCrypto implementations.
///
/// Stateless apart from the RNG handle; `Send + Sync` and cheap to share.
#[derive(Debug)]
pub struct RustCryptoProvider {
    random: OsRandom,
}

impl Default for RustCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self { random: OsRandom }
    }

    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
        aead::create_aead(algorithm)
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn kdf(&self, algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
        prf::create_prf(algorithm)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
        kex::create_key_exchange(algorithm)
    }

    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
        signature::create_signature(algorithm)
    }
}
