//! SHA-2 hash functions backed by `sha2`.

use sha2::{Digest, Sha256, Sha384};
use tls12only_crypto::{Hash, HashAlgorithm, Result};

/// Create a hash function instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    match algorithm {
        HashAlgorithm::Sha256 => Ok(Box::new(Sha256Hash(Sha256::new()))),
        HashAlgorithm::Sha384 => Ok(Box::new(Sha384Hash(Sha384::new()))),
    }
}

struct Sha256Hash(Sha256);

impl Hash for Sha256Hash {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

struct Sha384Hash(Sha384);

impl Hash for Sha384Hash {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha384
    }
}
