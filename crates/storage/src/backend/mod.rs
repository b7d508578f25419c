//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for storing and retrieving uploaded files. The production backend
//! is [`LocalBackend`]; [`MockBackend`] keeps everything in memory for tests.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::path::PathBuf;
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Chunked file contents, detached from the backend so it can be handed
/// straight to an HTTP response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Unified interface for storage backends.
///
/// All operations are asynchronous and take `&self`, so a single backend can
/// be shared between every request handler behind a
/// [`BackendHandle`](crate::BackendHandle). There is no locking: two writers
/// using the same name race, and the last one wins.
///
/// # Name Handling
/// Every name is a single path segment relative to the storage root and must
/// be validated using [`validate_name`](crate::validate_name) before use.
/// Implementations enforce this validation and return
/// [`InvalidName`](crate::error::ErrorKind::InvalidName) before touching
/// anything.
///
/// # Examples
///
/// ```
/// use storefront_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_hardcoded_file(backend: &dyn StorageBackend) -> Result<u64> {
///     let name = "1_1718000000000.png";
///     if backend.exists(name).await? {
///         let data = backend.read(name).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// The path a stored name resolves to, as recorded on product rows.
    ///
    /// Does not check whether anything exists at that location.
    fn locate(&self, name: &str) -> Result<PathBuf>;

    /// Create the storage root if it does not exist yet.
    ///
    /// Idempotent. Returns [`Unavailable`](crate::error::ErrorKind::Unavailable)
    /// if the root cannot be created or exists but is not a directory.
    async fn ensure_root(&self) -> Result<()>;

    /// List every stored file.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self) -> Result<Vec<FileInfo>> {
        self.list_stream().try_collect().await
    }

    /// Stream metadata for every stored file.
    ///
    /// A storage root that does not exist yet yields an empty stream rather
    /// than an error: nothing has been uploaded.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use storefront_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream();
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.name, info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist or is not a regular file.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Open a file for streaming reads.
    ///
    /// The file is opened (and checked to be a regular file) before this
    /// returns, so [`NotFound`](crate::error::ErrorKind::NotFound) is reported
    /// here rather than halfway through a response body.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use futures::TryStreamExt;
    /// # use storefront_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> std::io::Result<()> {
    /// let mut body = backend.stream("1_1718000000000.png").await.unwrap();
    /// while let Some(chunk) = body.try_next().await? {
    ///     println!("received {} bytes", chunk.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn stream(&self, name: &str) -> Result<ByteStream>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. The storage root must already exist (see
    /// [`ensure_root()`](Self::ensure_root)).
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist or is not a regular file.
    async fn stat(&self, name: &str) -> Result<FileInfo>;
}
