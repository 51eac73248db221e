//! AEAD ciphers backed by `aes-gcm` and `chacha20poly1305`.

use aes_gcm::aead::{Aead as _, KeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::ChaCha20Poly1305;
use tls12only_crypto::{Aead, AeadAlgorithm, Error, Result};

/// Create an AEAD cipher instance for the specified algorithm.
pub fn create_aead(algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
    match algorithm {
        AeadAlgorithm::Aes128Gcm => Ok(Box::new(Aes128GcmImpl)),
        AeadAlgorithm::Aes256Gcm => Ok(Box::new(Aes256GcmImpl)),
        AeadAlgorithm::ChaCha20Poly1305 => Ok(Box::new(ChaCha20Poly1305Impl)),
    }
}

fn check_sizes(algorithm: AeadAlgorithm, key: &[u8], nonce: &[u8]) -> Result<()> {
    if key.len() != algorithm.key_size() {
        return Err(Error::InvalidKeySize {
            expected: algorithm.key_size(),
            actual: key.len(),
        });
    }
    if nonce.len() != algorithm.nonce_size() {
        return Err(Error::InvalidNonceSize {
            expected: algorithm.nonce_size(),
            actual: nonce.len(),
        });
    }
    Ok(())
}

fn seal_with<C>(
    algorithm: AeadAlgorithm,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>>
where
    C: KeyInit + aes_gcm::aead::Aead,
{
    check_sizes(algorithm, key, nonce)?;
    let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
        expected: algorithm.key_size(),
        actual: key.len(),
    })?;
    cipher
        .encrypt(
            Nonce::<C>::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| Error::CryptoError(format!("{} encryption failed", algorithm.name())))
}

fn open_with<C>(
    algorithm: AeadAlgorithm,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>>
where
    C: KeyInit + aes_gcm::aead::Aead,
{
    check_sizes(algorithm, key, nonce)?;
    if ciphertext.len() < algorithm.tag_size() {
        return Err(Error::AuthenticationFailed);
    }
    let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
        expected: algorithm.key_size(),
        actual: key.len(),
    })?;
    cipher
        .decrypt(
            Nonce::<C>::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| Error::AuthenticationFailed)
}

/// AES-128-GCM (16-byte key, 12-byte nonce, 16-byte tag).
#[derive(Debug)]
struct Aes128GcmImpl;

impl Aead for Aes128GcmImpl {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        seal_with::<Aes128Gcm>(self.algorithm(), key, nonce, aad, plaintext)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        open_with::<Aes128Gcm>(self.algorithm(), key, nonce, aad, ciphertext)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        AeadAlgorithm::Aes128Gcm
    }
}

/// AES-256-GCM (32-byte key, 12-byte nonce, 16-byte tag).
#[derive(Debug)]
struct Aes256GcmImpl;

impl Aead for Aes256GcmImpl {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        seal_with::<Aes256Gcm>(self.algorithm(), key, nonce, aad, plaintext)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        open_with::<Aes256Gcm>(self.algorithm(), key, nonce, aad, ciphertext)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        AeadAlgorithm::Aes256Gcm
    }
}

/// ChaCha20-Poly1305 (RFC 8439).
#[derive(Debug)]
struct ChaCha20Poly1305Impl;

impl Aead for ChaCha20Poly1305Impl {
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        seal_with::<ChaCha20Poly1305>(self.algorithm(), key, nonce, aad, plaintext)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        open_with::<ChaCha20Poly1305>(self.algorithm(), key, nonce, aad, ciphertext)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        AeadAlgorithm::ChaCha20Poly1305
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes128_gcm_seal_open() {
        let aead = create_aead(AeadAlgorithm::Aes128Gcm).unwrap();
        let key = [0x11u8; 16];
        let nonce = [0x22u8; 12];

        let ciphertext = aead.seal(&key, &nonce, b"header", b"hello").unwrap();
        assert_eq!(ciphertext.len(), 5 + 16);

        let plaintext = aead.open(&key, &nonce, b"header", &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn test_tampered_aad_is_rejected() {
        let aead = create_aead(AeadAlgorithm::ChaCha20Poly1305).unwrap();
        let key = [0x33u8; 32];
        let nonce = [0x44u8; 12];

        let ciphertext = aead.seal(&key, &nonce, b"aad-1", b"payload").unwrap();
        assert_eq!(
            aead.open(&key, &nonce, b"aad-2", &ciphertext),
            Err(Error::AuthenticationFailed)
        );
    }

    #[test]
    fn test_invalid_key_size() {
        let aead = create_aead(AeadAlgorithm::Aes256Gcm).unwrap();
        let result = aead.seal(&[0u8; 16], &[0u8; 12], b"", b"data");
        assert_eq!(
            result,
            Err(Error::InvalidKeySize {
                expected: 32,
                actual: 16
            })
        );
    }

    #[test]
    fn test_short_ciphertext() {
        let aead = create_aead(AeadAlgorithm::Aes128Gcm).unwrap();
        let result = aead.open(&[0u8; 16], &[0u8; 12], b"", &[0u8; 8]);
        assert_eq!(result, Err(Error::AuthenticationFailed));
    }
}
