//! RSA-PSS over SHA-256 with MGF1(SHA-256) and the largest salt the key allows

use crate::{PrivateKey, PublicKey, Signature};
use otumat_errors::{Error, SigningError};
use rand::rngs::OsRng;
use rsa::Pss;
use sha2::{Digest, Sha256};
use tracing::debug;

const HASH_LEN: usize = 32;

/// Largest PSS salt for a modulus of `modulus_bits`: `emLen - hLen - 2`
#[must_use]
pub fn max_salt_len(modulus_bits: usize) -> usize {
    let em_len = modulus_bits.saturating_sub(1).div_ceil(8);
    em_len.saturating_sub(HASH_LEN + 2)
}

fn padding(modulus_bits: usize) -> Pss {
    Pss::new_with_salt::<Sha256>(max_salt_len(modulus_bits))
}

/// Sign the UTF-8 bytes of `data`
///
/// # Errors
/// Returns [`SigningError::CryptoOperation`] if the signature cannot be produced.
pub fn sign(key: &PrivateKey, data: &str) -> Result<Signature, Error> {
    let digest = Sha256::digest(data.as_bytes());
    let bytes = key
        .as_rsa()
        .sign_with_rng(&mut OsRng, padding(key.bits()), &digest)
        .map_err(|e| SigningError::CryptoOperation {
            message: e.to_string(),
        })?;

    debug!("signed {} bytes with {}-bit key", data.len(), key.bits());
    Ok(Signature::from_bytes(bytes))
}

/// Check a decoded signature over the UTF-8 bytes of `data`
///
/// # Errors
/// Returns [`SigningError::VerificationFailed`] if the signature does not match.
pub fn verify_signature(key: &PublicKey, data: &str, signature: &Signature) -> Result<(), Error> {
    let digest = Sha256::digest(data.as_bytes());
    key.as_rsa()
        .verify(padding(key.bits()), &digest, signature.as_bytes())
        .map_err(|e| SigningError::VerificationFailed {
            reason: e.to_string(),
        })?;

    debug!("signature verified with {}-bit key", key.bits());
    Ok(())
}

/// Check sidecar signature text over the UTF-8 bytes of `data`
///
/// # Errors
/// Returns [`SigningError::VerificationFailed`] if the text does not decode or
/// the signature does not match.
pub fn verify(key: &PublicKey, data: &str, signature_text: &str) -> Result<(), Error> {
    let signature = Signature::from_text(signature_text)?;
    verify_signature(key, data, &signature)
}
