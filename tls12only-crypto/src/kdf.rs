//! TLS 1.2 pseudo-random function interface (RFC 5246 Section 5).

use crate::{HashAlgorithm, Result};

/// PRF variants selected by the cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdfAlgorithm {
    /// P_SHA256, used by every suite without an explicit PRF hash.
    TlsPrfSha256,

    /// P_SHA384, used by `*_SHA384` suites.
    TlsPrfSha384,
}

impl KdfAlgorithm {
    /// Get the underlying hash algorithm.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            KdfAlgorithm::TlsPrfSha256 => HashAlgorithm::Sha256,
            KdfAlgorithm::TlsPrfSha384 => HashAlgorithm::Sha384,
        }
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::TlsPrfSha256 => "TLS-PRF-SHA256",
            KdfAlgorithm::TlsPrfSha384 => "TLS-PRF-SHA384",
        }
    }
}

/// TLS 1.2 PRF.
///
/// `PRF(secret, label, seed) = P_<hash>(secret, label + seed)`
pub trait Kdf: Send + Sync {
    /// Produce `length` bytes of output.
    fn prf(&self, secret: &[u8], label: &[u8], seed: &[u8], length: usize) -> Result<Vec<u8>>;

    /// Get the algorithm identifier.
    fn algorithm(&self) -> KdfAlgorithm;
}
