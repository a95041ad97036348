//! Sidecar artifact error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("missing sidecar: {path}")]
    MissingSidecar { path: String },

    #[error("signature does not verify with public key {public_key}")]
    KeyMismatch { public_key: String },

    #[error("no signing keys configured for package {package}")]
    NothingToWrite { package: String },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("invalid package directory: {path}")]
    InvalidPackageDir { path: String },

    #[error("sidecar location {out_dir} is inside the signed tree {package_dir}")]
    SidecarInsideTree {
        out_dir: String,
        package_dir: String,
    },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingSidecar { .. } => {
                Some("Run `otumat package` at build time so the sidecars ship with the package.")
            }
            Self::KeyMismatch { .. } => {
                Some("The private and public keys are not a pair; check the configured key paths.")
            }
            Self::NothingToWrite { .. } => {
                Some("Set keys.private_key and keys.public_key, or pass --privkey/--pubkey.")
            }
            Self::SidecarInsideTree { .. } => {
                Some("Write sidecars next to the package directory, not inside it.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingSidecar { .. } => "package.missing_sidecar",
            Self::KeyMismatch { .. } => "package.key_mismatch",
            Self::NothingToWrite { .. } => "package.nothing_to_write",
            Self::WriteFailed { .. } => "package.write_failed",
            Self::InvalidPackageDir { .. } => "package.invalid_package_dir",
            Self::SidecarInsideTree { .. } => "package.sidecar_inside_tree",
        };
        Some(code)
    }
}
