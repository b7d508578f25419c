//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist (or exists but is not a regular file)
    #[display("file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied by the operating system
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Name contains separators, relative segments or null bytes
    #[display("invalid name: {_0:?}")]
    InvalidName(#[error(not(source))] String),
    /// Storage root is missing, not a directory, or could not be created
    #[display("storage unavailable: {}", _0.display())]
    Unavailable(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }

    /// Returns `true` if the object could not be found (or could never
    /// exist, because its name is invalid).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidName(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("1_2.png".to_string()).to_string(), "file not found: 1_2.png");
        assert_eq!(ErrorKind::InvalidName("../x".to_string()).to_string(), "invalid name: \"../x\"");
        assert_eq!(
            ErrorKind::Unavailable(PathBuf::from("/srv/images")).to_string(),
            "storage unavailable: /srv/images"
        );
    }

    #[test]
    fn retryable_and_not_found() {
        assert!(ErrorKind::Unavailable(PathBuf::from("/")).is_retryable());
        assert!(!ErrorKind::InvalidName(String::new()).is_retryable());
        assert!(ErrorKind::InvalidName(String::new()).is_not_found());
        assert!(!ErrorKind::PermissionDenied(String::new()).is_not_found());
    }
}
