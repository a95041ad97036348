//! Signing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("invalid key: {message}")]
    KeyFormat { message: String },

    #[error("signing failed: {message}")]
    CryptoOperation { message: String },

    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::KeyFormat { .. } => Some(
                "Provide an unencrypted PEM RSA key (PKCS#8 or PKCS#1 private key, SPKI or PKCS#1 public key).",
            ),
            Self::VerificationFailed { .. } => {
                Some("The package contents or its signature were modified; do not trust it.")
            }
            Self::CryptoOperation { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::KeyFormat { .. } => "signing.key_format",
            Self::CryptoOperation { .. } => "signing.crypto_operation",
            Self::VerificationFailed { .. } => "signing.verification_failed",
        };
        Some(code)
    }
}
