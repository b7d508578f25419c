//! Server Error Types
//!
//! Failures that stop the server from starting or running. Errors raised
//! while handling a single request never end up here; they become a status
//! code in [`ApiError`](crate::response::ApiError).

use derive_more::{Display, Error};
use std::net::SocketAddr;

/// A server error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for server startup and shutdown.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A configured CORS origin is not a valid header value.
    #[display("invalid CORS origin: {_0:?}")]
    InvalidOrigin(#[error(not(source))] String),
    /// The image prefix cannot be mounted as a route.
    #[display("image prefix cannot be routed: {_0:?}")]
    InvalidPrefix(#[error(not(source))] String),
    #[display("could not bind to {_0}")]
    Bind(#[error(not(source))] SocketAddr),
    #[display("server terminated unexpectedly")]
    Serve,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bind(_))
    }
}
