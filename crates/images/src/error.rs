//! Image Workflow Error Types
//!
//! Storage and catalog errors are raised into one of these kinds, so the
//! HTTP layer only has to decide on a status code per variant.

use derive_more::{Display, Error};

/// An image workflow error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for image workflows.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an image workflow failure.
///
/// ### Client Errors
/// - [`ErrorKind::MalformedFilename`]
/// - [`ErrorKind::NotFound`]
///
/// ### Dependency Errors
/// - [`ErrorKind::StorageUnavailable`]
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Prune`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The client filename has no extension to keep, or the extension could
    /// not be part of a stored name.
    #[display("malformed filename: {_0:?}")]
    MalformedFilename(#[error(not(source))] String),
    /// The image directory could not be written to.
    #[display("image storage unavailable")]
    StorageUnavailable,
    /// No stored image can be served under this name.
    #[display("image not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A product catalog query failed.
    #[display("product catalog error")]
    Catalog,
    /// An orphan pruning step failed.
    #[display("pruning failed")]
    Prune,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable | Self::Catalog)
    }
}
