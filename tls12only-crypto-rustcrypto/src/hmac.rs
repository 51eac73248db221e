//! HMAC backed by the `hmac` crate.

use hmac::{Hmac as HmacCore, Mac};
use sha2::{Sha256, Sha384};
use tls12only_crypto::{Error, HashAlgorithm, Hmac, Result};

/// Create an HMAC instance keyed with `key`.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    let invalid_key = |_| Error::CryptoError("HMAC key rejected".into());
    match algorithm {
        HashAlgorithm::Sha256 => Ok(Box::new(HmacSha256(
            HmacCore::<Sha256>::new_from_slice(key).map_err(invalid_key)?,
        ))),
        HashAlgorithm::Sha384 => Ok(Box::new(HmacSha384(
            HmacCore::<Sha384>::new_from_slice(key).map_err(invalid_key)?,
        ))),
    }
}

struct HmacSha256(HmacCore<Sha256>);

impl Hmac for HmacSha256 {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().into_bytes().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

struct HmacSha384(HmacCore<Sha384>);

impl Hmac for HmacSha384 {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().into_bytes().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha384
    }
}
