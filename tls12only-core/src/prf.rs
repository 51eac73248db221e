//! TLS 1.2 PRF and key derivation (RFC 5246 Section 5, RFC 7627).
//!
//! ```text
//! PRF(secret, label, seed) = P_<hash>(secret, label + seed)
//!
//! master_secret = PRF(pre_master_secret, "master secret",
//!                     ClientHello.random + ServerHello.random)[0..47]
//!
//! master_secret = PRF(pre_master_secret, "extended master secret",
//!                     session_hash)[0..47]                      (EMS)
//!
//! key_block = PRF(master_secret, "key expansion",
//!                 server_random + client_random)
//!
//! verify_data = PRF(master_secret, finished_label,
//!                   Hash(handshake_messages))[0..11]
//! ```

use crate::error::{Error, Result};
use crate::messages::finished::VERIFY_DATA_LENGTH;
use tls12only_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

/// Length of the master secret.
pub const MASTER_SECRET_LENGTH: usize = 48;

/// Label for the client's Finished message.
pub const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";

/// Label for the server's Finished message.
pub const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

/// TLS 1.2 PRF bound to a provider and the suite's hash.
pub struct Tls12Prf<'a> {
    provider: &'a dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
}

impl std::fmt::Debug for Tls12Prf<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tls12Prf")
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}

impl<'a> Tls12Prf<'a> {
    /// Create a PRF using the given hash (SHA-256 or SHA-384).
    pub fn new(provider: &'a dyn CryptoProvider, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            provider,
            hash_algorithm,
        }
    }

    /// Compute `PRF(secret, label, seed)` truncated to `output_len` bytes.
    pub fn compute(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Vec<u8>> {
        let kdf = self
            .provider
            .kdf(self.hash_algorithm.to_kdf_algorithm())
            .map_err(|e| Error::CryptoError(format!("Failed to get TLS PRF: {}", e)))?;

        Ok(kdf.prf(secret, label, seed, output_len)?)
    }
}

fn check_random(name: &str, random: &[u8]) -> Result<()> {
    if random.len() != 32 {
        return Err(Error::InvalidMessage(format!(
            "{} random must be 32 bytes, got {}",
            name,
            random.len()
        )));
    }
    Ok(())
}

fn check_master_secret(master_secret: &[u8]) -> Result<()> {
    if master_secret.len() != MASTER_SECRET_LENGTH {
        return Err(Error::InternalError(format!(
            "Master secret must be {} bytes, got {}",
            MASTER_SECRET_LENGTH,
            master_secret.len()
        )));
    }
    Ok(())
}

/// Derive the master secret from the premaster secret and hello randoms.
pub fn compute_master_secret(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    premaster_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    check_random("Client", client_random)?;
    check_random("Server", server_random)?;

    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);

    Tls12Prf::new(provider, hash_algorithm)
        .compute(premaster_secret, b"master secret", &seed, MASTER_SECRET_LENGTH)
        .map(Zeroizing::new)
}

/// Derive the extended master secret (RFC 7627 Section 4).
///
/// `session_hash` is the transcript hash up to and including
/// ClientKeyExchange.
pub fn compute_extended_master_secret(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    premaster_secret: &[u8],
    session_hash: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if session_hash.len() != hash_algorithm.output_size() {
        return Err(Error::InternalError(format!(
            "Session hash must be {} bytes, got {}",
            hash_algorithm.output_size(),
            session_hash.len()
        )));
    }

    Tls12Prf::new(provider, hash_algorithm)
        .compute(
            premaster_secret,
            b"extended master secret",
            session_hash,
            MASTER_SECRET_LENGTH,
        )
        .map(Zeroizing::new)
}

/// Expand the master secret into `length` bytes of key block.
///
/// Note the seed order: server random first.
pub fn compute_key_block(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    check_master_secret(master_secret)?;
    check_random("Client", client_random)?;
    check_random("Server", server_random)?;

    let mut seed = Vec::with_capacity(64);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    Tls12Prf::new(provider, hash_algorithm)
        .compute(master_secret, b"key expansion", &seed, length)
        .map(Zeroizing::new)
}

/// Compute Finished verify_data over a transcript hash.
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    label: &[u8],
    handshake_hash: &[u8],
) -> Result<[u8; VERIFY_DATA_LENGTH]> {
    check_master_secret(master_secret)?;

    let output = Tls12Prf::new(provider, hash_algorithm).compute(
        master_secret,
        label,
        handshake_hash,
        VERIFY_DATA_LENGTH,
    )?;

    output
        .as_slice()
        .try_into()
        .map_err(|_| Error::InternalError("PRF returned a short verify_data".into()))
}
