use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command-line operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which step of a command failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the product catalog")]
    Database,
    #[display("image directory is unavailable")]
    Storage,
    #[display("server error")]
    Server,
    #[display("could not import products")]
    Import,
    #[display("could not prune orphaned images")]
    Prune,
}
