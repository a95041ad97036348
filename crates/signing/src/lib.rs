#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! RSA-PSS signing and verification of package tree digests
//!
//! A package is signed by hashing its directory with
//! [`otumat_hash::TreeHasher`] and signing the hex digest string. Verification
//! always recomputes the digest from the tree on disk.

mod keys;
mod pss;
mod signature;

pub use keys::{PrivateKey, PublicKey};
pub use pss::{max_salt_len, sign, verify, verify_signature};
pub use signature::Signature;

use otumat_errors::Error;
use otumat_hash::TreeHasher;
use std::path::Path;
use tracing::debug;

/// Sign `data` with the PEM private key at `private_key_path`.
/// Returns the signature as sidecar text.
///
/// # Errors
/// Returns an error if the key cannot be read or parsed, or if signing fails.
pub fn sign_file(private_key_path: &Path, data: &str) -> Result<String, Error> {
    let key = PrivateKey::from_pem_file(private_key_path)?;
    Ok(sign(&key, data)?.to_text())
}

/// Verify sidecar signature text over `data` with the PEM public key at
/// `public_key_path`.
///
/// # Errors
/// Returns an error if the key cannot be read or parsed; a signature that
/// does not match yields [`otumat_errors::SigningError::VerificationFailed`].
pub fn verify_file(public_key_path: &Path, data: &str, signature_text: &str) -> Result<(), Error> {
    let key = PublicKey::from_pem_file(public_key_path)?;
    verify(&key, data, signature_text)
}

/// Digest the tree at `root` and sign the digest.
/// Returns the signature as sidecar text.
///
/// # Errors
/// Returns an error if the key is unusable, the tree cannot be read, or
/// signing fails.
pub fn sign_tree(private_key_path: &Path, root: &Path, hasher: &TreeHasher) -> Result<String, Error> {
    let key = PrivateKey::from_pem_file(private_key_path)?;
    let digest = hasher.digest(root)?;
    debug!("signing tree {} with digest {digest}", root.display());
    Ok(sign(&key, &digest.to_hex())?.to_text())
}

/// Recompute the digest of the tree at `root` and verify `signature_text`
/// against it.
///
/// # Errors
/// Returns an error if the key is unusable or the tree cannot be read; a
/// signature that does not match yields
/// [`otumat_errors::SigningError::VerificationFailed`].
pub fn verify_tree(
    public_key_path: &Path,
    root: &Path,
    signature_text: &str,
    hasher: &TreeHasher,
) -> Result<(), Error> {
    let key = PublicKey::from_pem_file(public_key_path)?;
    let digest = hasher.digest(root)?;
    debug!("verifying tree {} with digest {digest}", root.display());
    verify(&key, &digest.to_hex(), signature_text)
}
