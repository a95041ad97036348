//! PEM key loading

use otumat_errors::{Error, SigningError};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::path::Path;

/// An RSA private key used for signing
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    #[must_use]
    pub fn from_rsa(inner: RsaPrivateKey) -> Self {
        Self { inner }
    }

    /// Parse an unencrypted PKCS#8 or PKCS#1 PEM private key
    ///
    /// # Errors
    /// Returns [`SigningError::KeyFormat`] if the text is not an unencrypted
    /// RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let inner = match pem_label(pem) {
            Some("PRIVATE KEY") => RsaPrivateKey::from_pkcs8_pem(pem).map_err(key_format)?,
            Some("RSA PRIVATE KEY") if pem.contains("ENCRYPTED") => {
                return Err(encrypted_key());
            }
            Some("RSA PRIVATE KEY") => RsaPrivateKey::from_pkcs1_pem(pem).map_err(key_format)?,
            Some("ENCRYPTED PRIVATE KEY") => return Err(encrypted_key()),
            Some(other) => {
                return Err(SigningError::KeyFormat {
                    message: format!("expected an RSA private key, found {other}"),
                }
                .into())
            }
            None => return Err(no_pem_block()),
        };
        Ok(Self { inner })
    }

    /// Read and parse a PEM private key file
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or
    /// [`SigningError::KeyFormat`] if it does not hold a usable key.
    pub fn from_pem_file(path: &Path) -> Result<Self, Error> {
        Self::from_pem(&read_pem(path)?)
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_rsa(self.inner.to_public_key())
    }

    /// Modulus size in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// An RSA public key used for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    #[must_use]
    pub fn from_rsa(inner: RsaPublicKey) -> Self {
        Self { inner }
    }

    /// Parse an SPKI or PKCS#1 PEM public key
    ///
    /// # Errors
    /// Returns [`SigningError::KeyFormat`] if the text is not an RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let inner = match pem_label(pem) {
            Some("PUBLIC KEY") => RsaPublicKey::from_public_key_pem(pem).map_err(key_format)?,
            Some("RSA PUBLIC KEY") => RsaPublicKey::from_pkcs1_pem(pem).map_err(key_format)?,
            Some(other) => {
                return Err(SigningError::KeyFormat {
                    message: format!("expected an RSA public key, found {other}"),
                }
                .into())
            }
            None => return Err(no_pem_block()),
        };
        Ok(Self { inner })
    }

    /// Read and parse a PEM public key file
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or
    /// [`SigningError::KeyFormat`] if it does not hold a usable key.
    pub fn from_pem_file(path: &Path) -> Result<Self, Error> {
        Self::from_pem(&read_pem(path)?)
    }

    /// Modulus size in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

fn read_pem(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => SigningError::KeyFormat {
            message: format!("{} is not PEM text", path.display()),
        }
        .into(),
        _ => Error::io_with_path(&e, path),
    })
}

/// Label of the first PEM block, e.g. `PRIVATE KEY`
fn pem_label(pem: &str) -> Option<&str> {
    const BEGIN: &str = "-----BEGIN ";
    let start = pem.find(BEGIN)? + BEGIN.len();
    let rest = &pem[start..];
    let end = rest.find("-----")?;
    Some(&rest[..end])
}

fn key_format(err: impl fmt::Display) -> Error {
    SigningError::KeyFormat {
        message: err.to_string(),
    }
    .into()
}

fn encrypted_key() -> Error {
    SigningError::KeyFormat {
        message: "encrypted private keys are not supported".to_string(),
    }
    .into()
}

fn no_pem_block() -> Error {
    SigningError::KeyFormat {
        message: "no PEM block found".to_string(),
    }
    .into()
}
