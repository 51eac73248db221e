//! Cryptographically Secure Random Number Generator (CSPRNG) interface.

use crate::Result;

/// Random number generator trait.
///
/// Implementations MUST be seeded from an OS entropy source.
pub trait Random: Send + Sync {
    /// Fill a buffer with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Generate a random byte vector of specified length.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Generate a fixed-size random array (client/server randoms).
    fn array32(&self) -> Result<[u8; 32]> {
        let mut buf = [0u8; 32];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
