//! Sidecar text form of a signature: standard base64 plus one newline

use base64::{engine::general_purpose::STANDARD, Engine as _};
use otumat_errors::{Error, SigningError};

/// Raw RSA-PSS signature bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode for a `.sig` sidecar
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = STANDARD.encode(&self.bytes);
        text.push('\n');
        text
    }

    /// Decode sidecar text; a single trailing newline is optional.
    ///
    /// Text that does not decode is treated as a forged signature.
    ///
    /// # Errors
    /// Returns [`SigningError::VerificationFailed`] if the text is not base64.
    pub fn from_text(text: &str) -> Result<Self, Error> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let bytes = STANDARD
            .decode(body)
            .map_err(|e| SigningError::VerificationFailed {
                reason: format!("signature is not valid base64: {e}"),
            })?;
        Ok(Self { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_has_single_trailing_newline() {
        let sig = Signature::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(sig.to_text(), "AQIDBA==\n");
    }

    #[test]
    fn test_newline_is_optional() {
        let with = Signature::from_text("AQIDBA==\n").unwrap();
        let without = Signature::from_text("AQIDBA==").unwrap();
        assert_eq!(with, without);
        assert_eq!(with.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_only_one_newline_is_stripped() {
        assert!(Signature::from_text("AQIDBA==\n\n").is_err());
        assert!(Signature::from_text("AQIDBA==\r").is_err());
    }

    #[test]
    fn test_invalid_base64_is_verification_failure() {
        let err = Signature::from_text("not*base64\n").unwrap_err();
        assert!(err.is_verification_failure());
    }
}
