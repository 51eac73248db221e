//! ECDSA signatures backed by `p256`.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use tls12only_crypto::{
    Error, Result, Signature, SignatureAlgorithm, SigningKey, VerifyingKey,
};

/// Create a signature scheme instance.
pub fn create_signature(algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
    match algorithm {
        SignatureAlgorithm::EcdsaSecp256r1Sha256 => Ok(Box::new(EcdsaP256Sig)),
    }
}

/// ECDSA P-256 with SHA-256.
///
/// Signing keys are 32-byte scalars, verifying keys are SEC1 points and
/// signatures travel DER-encoded as TLS 1.2 requires.
#[derive(Debug)]
struct EcdsaP256Sig;

impl Signature for EcdsaP256Sig {
    fn sign(&self, signing_key: &SigningKey, message: &[u8]) -> Result<Vec<u8>> {
        let key = p256::ecdsa::SigningKey::from_slice(signing_key.as_bytes())
            .map_err(|_| Error::InvalidPrivateKey)?;
        let signature: p256::ecdsa::Signature = key
            .try_sign(message)
            .map_err(|e| Error::CryptoError(format!("ECDSA signing failed: {}", e)))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(verifying_key)
            .map_err(|_| Error::InvalidPublicKey)?;
        let signature =
            p256::ecdsa::Signature::from_der(signature).map_err(|_| Error::InvalidSignature)?;
        key.verify(message, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        let key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let point = key.verifying_key().as_affine().to_encoded_point(false);
        Ok((
            SigningKey::from_bytes(key.to_bytes().to_vec()),
            VerifyingKey::from_bytes(point.as_bytes().to_vec()),
        ))
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaSecp256r1Sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let sig = create_signature(SignatureAlgorithm::EcdsaSecp256r1Sha256).unwrap();
        let (signing_key, verifying_key) = sig.generate_keypair().unwrap();
        assert_eq!(verifying_key.as_bytes().len(), 65);

        let signature = sig.sign(&signing_key, b"server params").unwrap();
        // DER SEQUENCE of two INTEGERs
        assert_eq!(signature[0], 0x30);

        sig.verify(verifying_key.as_bytes(), b"server params", &signature)
            .unwrap();
        assert_eq!(
            sig.verify(verifying_key.as_bytes(), b"other params", &signature),
            Err(Error::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let sig = create_signature(SignatureAlgorithm::EcdsaSecp256r1Sha256).unwrap();
        let (_, verifying_key) = sig.generate_keypair().unwrap();

        assert_eq!(
            sig.verify(&[0x04; 10], b"m", &[0x30, 0x00]),
            Err(Error::InvalidPublicKey)
        );
        assert_eq!(
            sig.verify(verifying_key.as_bytes(), b"m", &[0xFF; 8]),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            sig.sign(&SigningKey::from_bytes(vec![0u8; 32]), b"m"),
            Err(Error::InvalidPrivateKey)
        );
    }
}
