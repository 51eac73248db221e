//! TLS 1.2 PRF (RFC 5246 Section 5).
//!
//! ```text
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                        HMAC_hash(secret, A(2) + seed) + ...
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//! ```

use crate::hmac::create_hmac;
use tls12only_crypto::{Kdf, KdfAlgorithm, Result};
use zeroize::Zeroizing;

/// Create a PRF instance.
pub fn create_prf(algorithm: KdfAlgorithm) -> Result<Box<dyn Kdf>> {
    Ok(Box::new(TlsPrf { algorithm }))
}

#[derive(Debug)]
struct TlsPrf {
    algorithm: KdfAlgorithm,
}

impl Kdf for TlsPrf {
    fn prf(&self, secret: &[u8], label: &[u8], seed: &[u8], length: usize) -> Result<Vec<u8>> {
        let hash = self.algorithm.hash_algorithm();

        let mut label_seed = Vec::with_capacity(label.len() + seed.len());
        label_seed.extend_from_slice(label);
        label_seed.extend_from_slice(seed);

        let mut output = Vec::with_capacity(length + hash.output_size());

        // A(1)
        let mut mac = create_hmac(hash, secret)?;
        mac.update(&label_seed);
        let mut a = Zeroizing::new(mac.finalize());

        while output.len() < length {
            let mut mac = create_hmac(hash, secret)?;
            mac.update(&a);
            mac.update(&label_seed);
            output.extend_from_slice(&mac.finalize());

            let mut mac = create_hmac(hash, secret)?;
            mac.update(&a);
            a = Zeroizing::new(mac.finalize());
        }

        output.truncate(length);
        Ok(output)
    }

    fn algorithm(&self) -> KdfAlgorithm {
        self.algorithm
    }
}
