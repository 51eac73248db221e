//! AEAD record protection (RFC 5246 Section 6.2.3.3, RFC 5288, RFC 7905).
//!
//! ```text
//! additional_data = seq_num(8) + type(1) + version(2) + length(2)
//!
//! AES-GCM:           nonce = fixed_iv(4) || explicit_nonce(8)
//!                    explicit_nonce = seq_num, sent before the ciphertext
//! ChaCha20-Poly1305: nonce = fixed_iv(12) XOR (0(4) || seq_num(8))
//!                    no explicit nonce on the wire
//! ```
//!
//! Sequence numbers restart at zero for each direction when its
//! ChangeCipherSpec is sent or received, and must never wrap.

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::MAX_FRAGMENT_SIZE;
use tls12only_crypto::CryptoProvider;
use zeroize::Zeroizing;

/// Write keys and IVs for both directions, sliced from the key block.
///
/// ```text
/// client_write_key[key_len] server_write_key[key_len]
/// client_write_IV[iv_len]   server_write_IV[iv_len]
/// ```
pub struct KeyMaterial {
    suite: CipherSuite,
    client_write_key: Zeroizing<Vec<u8>>,
    server_write_key: Zeroizing<Vec<u8>>,
    client_write_iv: Zeroizing<Vec<u8>>,
    server_write_iv: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Partition a key block for `suite`.
    pub fn from_key_block(key_block: &[u8], suite: CipherSuite) -> Result<Self> {
        if key_block.len() < suite.key_block_length() {
            return Err(Error::InternalError(format!(
                "Key block too short for {}: {} < {}",
                suite,
                key_block.len(),
                suite.key_block_length()
            )));
        }

        let key_len = suite.key_length();
        let iv_len = suite.fixed_iv_length();
        let (client_key, rest) = key_block.split_at(key_len);
        let (server_key, rest) = rest.split_at(key_len);
        let (client_iv, rest) = rest.split_at(iv_len);
        let server_iv = &rest[..iv_len];

        Ok(Self {
            suite,
            client_write_key: Zeroizing::new(client_key.to_vec()),
            server_write_key: Zeroizing::new(server_key.to_vec()),
            client_write_iv: Zeroizing::new(client_iv.to_vec()),
            server_write_iv: Zeroizing::new(server_iv.to_vec()),
        })
    }

    /// Protection for records written by the client.
    pub fn client_write(&self) -> Result<RecordProtection> {
        RecordProtection::new(
            self.suite,
            self.client_write_key.to_vec(),
            self.client_write_iv.to_vec(),
        )
    }

    /// Protection for records written by the server.
    pub fn server_write(&self) -> Result<RecordProtection> {
        RecordProtection::new(
            self.suite,
            self.server_write_key.to_vec(),
            self.server_write_iv.to_vec(),
        )
    }
}

/// One direction of AEAD record protection.
pub struct RecordProtection {
    suite: CipherSuite,
    key: Zeroizing<Vec<u8>>,
    fixed_iv: Zeroizing<Vec<u8>>,
    sequence_number: u64,
}

impl std::fmt::Debug for RecordProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProtection")
            .field("suite", &self.suite)
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

impl RecordProtection {
    /// Create record protection from a write key and fixed IV.
    pub fn new(suite: CipherSuite, key: Vec<u8>, fixed_iv: Vec<u8>) -> Result<Self> {
        let key = Zeroizing::new(key);
        let fixed_iv = Zeroizing::new(fixed_iv);

        if key.len() != suite.key_length() {
            return Err(Error::InternalError(format!(
                "{} needs a {}-byte key, got {}",
                suite,
                suite.key_length(),
                key.len()
            )));
        }
        if fixed_iv.len() != suite.fixed_iv_length() {
            return Err(Error::InternalError(format!(
                "{} needs a {}-byte IV, got {}",
                suite,
                suite.fixed_iv_length(),
                fixed_iv.len()
            )));
        }

        Ok(Self {
            suite,
            key,
            fixed_iv,
            sequence_number: 0,
        })
    }

    /// Cipher suite in use.
    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Sequence number of the next record.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Protect one record fragment; returns the TLSCiphertext fragment.
    pub fn encrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        if plaintext.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }
        let seq = self.next_sequence_number()?;

        let nonce = self.nonce(seq);
        let aad = additional_data(seq, content_type, plaintext.len());
        let aead = provider.aead(self.suite.aead_algorithm())?;
        let ciphertext = aead.seal(&self.key, &nonce, &aad, plaintext)?;

        let explicit_len = self.suite.explicit_nonce_length();
        let mut record = Vec::with_capacity(explicit_len + ciphertext.len());
        if explicit_len > 0 {
            record.extend_from_slice(&seq.to_be_bytes());
        }
        record.extend_from_slice(&ciphertext);
        Ok(record)
    }

    /// Authenticate and decrypt one TLSCiphertext fragment.
    ///
    /// Authentication failures surface as [`Error::DecryptionFailed`]
    /// (`bad_record_mac`).
    pub fn decrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<Vec<u8>> {
        let explicit_len = self.suite.explicit_nonce_length();
        let tag_len = self.suite.aead_algorithm().tag_size();
        if fragment.len() < explicit_len + tag_len {
            return Err(Error::DecryptionFailed);
        }
        let seq = self.next_sequence_number()?;

        let (explicit, ciphertext) = fragment.split_at(explicit_len);
        let nonce = if explicit_len > 0 {
            let mut nonce = self.fixed_iv.to_vec();
            nonce.extend_from_slice(explicit);
            nonce
        } else {
            self.nonce(seq)
        };

        let plaintext_len = ciphertext.len() - tag_len;
        if plaintext_len > MAX_FRAGMENT_SIZE {
            return Err(Error::ProtocolError(ProtocolError::RecordOverflow));
        }

        let aad = additional_data(seq, content_type, plaintext_len);
        let aead = provider.aead(self.suite.aead_algorithm())?;
        aead.open(&self.key, &nonce, &aad, ciphertext)
            .map_err(|_| Error::DecryptionFailed)
    }

    fn next_sequence_number(&mut self) -> Result<u64> {
        let seq = self.sequence_number;
        self.sequence_number = seq
            .checked_add(1)
            .ok_or_else(|| Error::InternalError("Record sequence number exhausted".into()))?;
        Ok(seq)
    }

    fn nonce(&self, seq: u64) -> Vec<u8> {
        let mut nonce = self.fixed_iv.to_vec();
        if self.suite.explicit_nonce_length() > 0 {
            nonce.extend_from_slice(&seq.to_be_bytes());
        } else {
            for (n, s) in nonce[4..].iter_mut().zip(seq.to_be_bytes()) {
                *n ^= s;
            }
        }
        nonce
    }

    #[cfg(test)]
    fn set_sequence_number(&mut self, seq: u64) {
        self.sequence_number = seq;
    }
}

fn additional_data(seq: u64, content_type: ContentType, length: usize) -> [u8; 13] {
    let mut aad = [0u8; 13];
    aad[..8].copy_from_slice(&seq.to_be_bytes());
    aad[8] = content_type.to_u8();
    aad[9..11].copy_from_slice(&ProtocolVersion::Tls12.to_u16().to_be_bytes());
    aad[11..].copy_from_slice(&(length as u16).to_be_bytes());
    aad
}

#[cfg(test)]
mod tests {
    use super::*;
    use tls12only_crypto_rustcrypto::RustCryptoProvider;

    fn pair(suite: CipherSuite) -> (RecordProtection, RecordProtection) {
        let block: Vec<u8> = (0..suite.key_block_length() as u8).collect();
        let keys = KeyMaterial::from_key_block(&block, suite).unwrap();
        (keys.client_write().unwrap(), keys.client_write().unwrap())
    }

    #[test]
    fn test_gcm_explicit_nonce_is_sequence() {
        let provider = RustCryptoProvider::new();
        let (mut writer, mut reader) = pair(CipherSuite::EcdheEcdsaWithAes128GcmSha256);

        let first = writer
            .encrypt(&provider, ContentType::ApplicationData, b"hello")
            .unwrap();
        let second = writer
            .encrypt(&provider, ContentType::ApplicationData, b"world")
            .unwrap();
        assert_eq!(&first[..8], &0u64.to_be_bytes());
        assert_eq!(&second[..8], &1u64.to_be_bytes());
        assert_eq!(first.len(), 8 + 5 + 16);

        assert_eq!(
            reader.decrypt(&provider, ContentType::ApplicationData, &first).unwrap(),
            b"hello"
        );
        assert_eq!(
            reader.decrypt(&provider, ContentType::ApplicationData, &second).unwrap(),
            b"world"
        );
    }

    #[test]
    fn test_chacha_has_no_explicit_nonce() {
        let provider = RustCryptoProvider::new();
        let (mut writer, mut reader) = pair(CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256);

        let record = writer
            .encrypt(&provider, ContentType::Handshake, b"finished")
            .unwrap();
        assert_eq!(record.len(), 8 + 16);
        assert_eq!(
            reader.decrypt(&provider, ContentType::Handshake, &record).unwrap(),
            b"finished"
        );
    }

    #[test]
    fn test_tampering_and_content_type_are_authenticated() {
        let provider = RustCryptoProvider::new();
        let (mut writer, mut reader) = pair(CipherSuite::EcdheEcdsaWithAes256GcmSha384);

        let mut record = writer
            .encrypt(&provider, ContentType::ApplicationData, b"data")
            .unwrap();
        let mut wrong_type = reader_copy(&reader);
        assert_eq!(
            wrong_type.decrypt(&provider, ContentType::Handshake, &record),
            Err(Error::DecryptionFailed)
        );

        let last = record.len() - 1;
        record[last] ^= 1;
        assert_eq!(
            reader.decrypt(&provider, ContentType::ApplicationData, &record),
            Err(Error::DecryptionFailed)
        );
    }

    fn reader_copy(reader: &RecordProtection) -> RecordProtection {
        RecordProtection::new(reader.suite, reader.key.to_vec(), reader.fixed_iv.to_vec()).unwrap()
    }

    #[test]
    fn test_replayed_record_fails() {
        let provider = RustCryptoProvider::new();
        let (mut writer, mut reader) = pair(CipherSuite::EcdheEcdsaWithChacha20Poly1305Sha256);

        let record = writer.encrypt(&provider, ContentType::ApplicationData, b"x").unwrap();
        reader.decrypt(&provider, ContentType::ApplicationData, &record).unwrap();
        assert!(reader.decrypt(&provider, ContentType::ApplicationData, &record).is_err());
    }

    #[test]
    fn test_sequence_number_never_wraps() {
        let provider = RustCryptoProvider::new();
        let (mut writer, _) = pair(CipherSuite::EcdheEcdsaWithAes128GcmSha256);
        writer.set_sequence_number(u64::MAX);

        assert!(matches!(
            writer.encrypt(&provider, ContentType::ApplicationData, b"x"),
            Err(Error::InternalError(_))
        ));
    }

    #[test]
    fn test_key_block_partition() {
        let suite = CipherSuite::EcdheEcdsaWithAes128GcmSha256;
        let block: Vec<u8> = (0..40u8).collect();
        let keys = KeyMaterial::from_key_block(&block, suite).unwrap();
        assert_eq!(&keys.client_write_key[..], &block[..16]);
        assert_eq!(&keys.server_write_key[..], &block[16..32]);
        assert_eq!(&keys.client_write_iv[..], &block[32..36]);
        assert_eq!(&keys.server_write_iv[..], &block[36..40]);

        assert!(KeyMaterial::from_key_block(&block[..39], suite).is_err());
    }

    #[test]
    fn test_oversized_plaintext() {
        let provider = RustCryptoProvider::new();
        let (mut writer, _) = pair(CipherSuite::EcdheEcdsaWithAes128GcmSha256);
        let oversized = vec![0u8; MAX_FRAGMENT_SIZE + 1];
        assert_eq!(
            writer.encrypt(&provider, ContentType::ApplicationData, &oversized),
            Err(Error::ProtocolError(ProtocolError::RecordOverflow))
        );
    }
}
