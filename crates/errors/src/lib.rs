#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for otumat
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can be carried through reports.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod input;
pub mod package;
pub mod signing;

// Re-export all error types at the root
pub use config::ConfigError;
pub use input::InputError;
pub use package::PackageError;
pub use signing::SigningError;

/// Error returned by every otumat crate
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// An invariant the crates rely on did not hold
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// I/O failure on a known path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// True when a signature was well-formed input but did not validate.
    ///
    /// Callers use this to reject a tampered or forged package without
    /// mistaking the outcome for a malformed key, a missing file, or a bug.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::Signing(SigningError::VerificationFailed { .. }))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for otumat operations
pub type Result<T> = std::result::Result<T, Error>;

/// How an error is presented by the command line front end
pub trait UserFacingError {
    /// One-line message for stderr.
    fn user_message(&self) -> Cow<'_, str>;

    /// What the user can change to make the operation succeed.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// True if the failure may be transient, e.g. a file being written.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Input(err) => err.user_message(),
            Error::Signing(err) => err.user_message(),
            Error::Package(err) => err.user_message(),
            Error::Io {
                message,
                path: Some(path),
                ..
            } => Cow::Owned(format!("{}: {message}", path.display())),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Input(err) => err.user_hint(),
            Error::Signing(err) => err.user_hint(),
            Error::Package(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Input(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Input(err) => err.user_code(),
            Error::Signing(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Package(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
