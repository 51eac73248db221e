//! Random number generation from the operating system.

use rand_core::{OsRng, RngCore};
use tls12only_crypto::{Error, Random, Result};

/// RNG reading from the OS entropy source (`getrandom`).
#[derive(Debug, Clone, Copy)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}
