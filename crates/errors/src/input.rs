//! Errors raised while reading the tree being hashed

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum InputError {
    #[error("path not found: {path}")]
    RootNotFound { path: String },

    #[error("file inside the tree disappeared or is a dangling symlink: {path}")]
    EntryNotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("cannot read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("not a UTF-8 text file: {path}")]
    NotText { path: String },

    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: String },

    #[error("symlink cycle at {path}")]
    SymlinkCycle { path: String },

    #[error("unsupported file type: {path}")]
    UnsupportedFileType { path: String },

    #[error("invalid object id {value:?}: {message}")]
    InvalidObjectId { value: String, message: String },
}

impl InputError {
    /// Convert an `io::Error` raised on the tree root
    #[must_use]
    pub fn root_from_io(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::RootNotFound {
                path: path.display().to_string(),
            },
            _ => Self::from_io_with_path(err, path),
        }
    }

    /// Convert an `io::Error` raised on something inside the tree
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::EntryNotFound {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::InvalidData => Self::NotText {
                path: path.display().to_string(),
            },
            _ => Self::Unreadable {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl UserFacingError for InputError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RootNotFound { .. } | Self::NotADirectory { .. } => {
                Some("Pass the package directory itself, not a file inside it.")
            }
            Self::NotText { .. } => {
                Some("Only UTF-8 text files can be hashed; move binary files out of the package.")
            }
            Self::EntryNotFound { .. } => {
                Some("Remove dangling symlinks and do not modify the package while it is hashed.")
            }
            Self::Unreadable { .. } => Some("Check file permissions and retry."),
            Self::SymlinkCycle { .. } => Some("Remove the symlink that points back up the tree."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreadable { .. } | Self::EntryNotFound { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::RootNotFound { .. } => "input.root_not_found",
            Self::EntryNotFound { .. } => "input.entry_not_found",
            Self::NotADirectory { .. } => "input.not_a_directory",
            Self::Unreadable { .. } => "input.unreadable",
            Self::NotText { .. } => "input.not_text",
            Self::NonUtf8Path { .. } => "input.non_utf8_path",
            Self::SymlinkCycle { .. } => "input.symlink_cycle",
            Self::UnsupportedFileType { .. } => "input.unsupported_file_type",
            Self::InvalidObjectId { .. } => "input.invalid_object_id",
        };
        Some(code)
    }
}
