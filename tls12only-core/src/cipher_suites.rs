//! TLS 1.2 cipher suite definitions.
//!
//! Only ECDHE-ECDSA suites with AEAD record protection are implemented:
//! forward secrecy, no CBC, no RSA key transport. TLS 1.3 suites
//! (`0x1301..=0x1305`) are never recognised.

use tls12only_crypto::{AeadAlgorithm, HashAlgorithm};

/// TLS 1.2 cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CipherSuite {
    /// TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 (0xC02B) - RFC 5289
    EcdheEcdsaWithAes128GcmSha256 = 0xC02B,

    /// TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 (0xC02C) - RFC 5289
    EcdheEcdsaWithAes256GcmSha384 = 0xC02C,

    /// TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256 (0xCCA9) - RFC 7905
    EcdheEcdsaWithChacha20Poly1305Sha256 = 0xCCA9,
}

/// TLS_EMPTY_RENEGOTIATION_INFO_SCSV (RFC 5746).
pub const EMPTY_RENEGOTIATION_INFO_SCSV: u16 = 0x00FF;

impl CipherSuite {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0xC02B => Some(CipherSuite::EcdheEcdsaWithAes128GcmSha256),
            0xC02C => Some(CipherSuite::EcdheEcdsaWithAes256GcmSha384),
            0xCCA9 => Some(CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// AEAD used for record protection.
    pub const fn aead_algorithm(self) -> AeadAlgorithm {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256 => AeadAlgorithm::Aes128Gcm,
            CipherSuite::EcdheEcdsaWithAes256GcmSha384 => AeadAlgorithm::Aes256Gcm,
            CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256 => AeadAlgorithm::ChaCha20Poly1305,
        }
    }

    /// Hash for the PRF and the handshake transcript.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            CipherSuite::EcdheEcdsaWithAes256GcmSha384 => HashAlgorithm::Sha384,
            _ => HashAlgorithm::Sha256,
        }
    }

    /// Write key length.
    pub const fn key_length(self) -> usize {
        self.aead_algorithm().key_size()
    }

    /// Implicit IV length taken from the key block.
    ///
    /// GCM uses a 4-byte salt (RFC 5288), ChaCha20-Poly1305 a full 12-byte
    /// IV (RFC 7905).
    pub const fn fixed_iv_length(self) -> usize {
        match self {
            CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256 => 12,
            _ => 4,
        }
    }

    /// Explicit nonce bytes carried in each record.
    pub const fn explicit_nonce_length(self) -> usize {
        match self {
            CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256 => 0,
            _ => 8,
        }
    }

    /// Bytes of key block consumed: two keys and two IVs (no MAC keys for AEAD).
    pub const fn key_block_length(self) -> usize {
        2 * (self.key_length() + self.fixed_iv_length())
    }

    /// Bytes a record grows by when protected.
    pub const fn record_overhead(self) -> usize {
        self.explicit_nonce_length() + self.aead_algorithm().tag_size()
    }

    /// IANA name.
    pub const fn name(self) -> &'static str {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256 => {
                "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"
            },
            CipherSuite::EcdheEcdsaWithAes256GcmSha384 => {
                "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"
            },
            CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256 => {
                "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256"
            },
        }
    }
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Default suites in preference order.
pub fn default_cipher_suites() -> Vec<CipherSuite> {
    vec![
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256,
        CipherSuite::EcdheEcdsaWithAes256GcmSha384,
    ]
}
