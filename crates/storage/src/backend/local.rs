//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for a single flat
//! directory on the local filesystem, accessed using `tokio::fs` for async I/O.

use crate::backend::{ByteStream, FileInfoStream};
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_name};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tokio_util::io::ReaderStream;

/// Local filesystem storage backend.
///
/// Stores files directly inside a configured directory. All names are
/// relative to that root directory and may not contain separators.
///
/// # Examples
///
/// ```no_run
/// use storefront_storage::backend::{LocalBackend, StorageBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/srv/storefront/uploads/images").unwrap();
/// backend.ensure_root().await.unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory holding every uploaded file
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to the storage directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute. The directory itself is
    /// not created until [`ensure_root()`](StorageBackend::ensure_root) is
    /// called.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::Unavailable(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a storage name.
    ///
    /// Validates the name and joins it with the root directory.
    fn absolute_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_name(name)?))
    }

    fn metadata(name: &str, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(name, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, name: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory => ErrorKind::NotFound(name.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(name.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Open metadata for a name and make sure it refers to a regular file.
    async fn file_metadata(&self, name: &str) -> Result<(PathBuf, Metadata)> {
        let abs_path = self.absolute_path(name)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::NotFound(name.to_string()));
        }
        Ok((abs_path, metadata))
    }

    /// Keeps the `?` operator usable for a single directory entry; the stream
    /// loop in `list_stream` can only yield errors, not return them.
    async fn process_entry(entry: DirEntry) -> Result<Option<FileInfo>> {
        let file_name = entry.file_name();
        // Non-UTF8 names could never have been written through this backend.
        let Some(name) = file_name.to_str() else {
            return Ok(None);
        };
        if validate_name(name).is_err() {
            return Ok(None);
        }
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, name))?;
        if !metadata.is_file() {
            // Subdirectories and broken symlinks are not ours.
            return Ok(None);
        }
        Ok(Some(Self::metadata(name, metadata)?))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, name: &str) -> Result<PathBuf> {
        self.absolute_path(name)
    }

    async fn ensure_root(&self) -> Result<()> {
        let existing = match fs::metadata(&self.root).await {
            Ok(metadata) => Some(metadata),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => Err(e).or_raise(|| ErrorKind::Unavailable(self.root.clone()))?,
        };
        match existing {
            Some(metadata) if metadata.is_dir() => return Ok(()),
            Some(_) => exn::bail!(ErrorKind::Unavailable(self.root.clone())),
            None => {},
        }
        tracing::info!(backend = %self.name, root = %self.root.display(), "Creating storage directory");
        fs::create_dir_all(&self.root).await.or_raise(|| ErrorKind::Unavailable(self.root.clone()))
    }

    fn list_stream<'a>(&'a self) -> FileInfoStream<'a> {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                // Nothing has been uploaded yet.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(ErrorKind::Io(err)));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => { yield Err(exn::Exn::from(ErrorKind::Io(e))); continue; },
                };
                match Self::process_entry(entry).await {
                    Ok(Some(info)) => yield Ok(info),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn stream(&self, name: &str) -> Result<ByteStream> {
        let (abs_path, _metadata) = self.file_metadata(name).await?;
        let file = fs::File::open(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let abs_path = self.absolute_path(name)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, name))?)
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let (_abs_path, metadata) = self.file_metadata(name).await?;
        Self::metadata(name, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn backend(dir: &tempfile::TempDir) -> LocalBackend {
        LocalBackend::new("local", dir.path()).unwrap()
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "uploads/images").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_locate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        assert_eq!(backend.locate("1_2.png").unwrap(), temp_dir.path().join("1_2.png"));
        assert!(backend.locate("../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("uploads").join("images");
        let backend = LocalBackend::new("local", &root).unwrap();
        assert!(!root.exists());
        backend.ensure_root().await.unwrap();
        assert!(root.is_dir());
        backend.ensure_root().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_root_recreates_removed_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("images");
        let backend = LocalBackend::new("local", &root).unwrap();
        backend.ensure_root().await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();
        assert!(backend.write("1_1.png", b"data").await.is_err());
        backend.ensure_root().await.unwrap();
        backend.write("1_1.png", b"data").await.unwrap();
        assert_eq!(backend.read("1_1.png").await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_ensure_root_rejects_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("not-a-dir");
        std::fs::write(&root, b"occupied").unwrap();
        let backend = LocalBackend::new("local", &root).unwrap();
        let err = backend.ensure_root().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.write("1_1.png", b"\x89PNG").await.unwrap();
        assert_eq!(backend.read("1_1.png").await.unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.write("1_1.png", b"first").await.unwrap();
        backend.write("1_1.png", b"second").await.unwrap();
        assert_eq!(backend.read("1_1.png").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_write_without_root_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path().join("missing")).unwrap();
        assert!(backend.write("1_1.png", b"data").await.is_err());
    }

    #[tokio::test]
    async fn test_stream() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        let data: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        backend.write("big.jpg", &data).await.unwrap();
        let chunks: Vec<_> = backend.stream("big.jpg").await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_stream_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        let err = backend.stream("missing.png").await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();
        let err = backend.stream("subdir").await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = backend.stat("subdir").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        assert!(!backend.exists("nonexistent.png").await.unwrap());
        backend.write("exists.png", b"data").await.unwrap();
        assert!(backend.exists("exists.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.write("file.png", b"data").await.unwrap();
        backend.delete("file.png").await.unwrap();
        assert!(!backend.exists("file.png").await.unwrap());
        let err = backend.delete("file.png").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stat() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.write("file.png", b"Hello, world!").await.unwrap();
        let info = backend.stat("file.png").await.unwrap();
        assert_eq!(info.name, "file.png");
        assert_eq!(info.size, 13);
    }

    #[tokio::test]
    async fn test_list_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path().join("missing")).unwrap();
        assert!(backend.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        backend.write("1_1.png", b"a").await.unwrap();
        backend.write("2_2.jpg", b"b").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        let mut names: Vec<_> = backend.list().await.unwrap().into_iter().map(|f| f.name).collect();
        names.sort();
        assert_eq!(names, vec!["1_1.png", "2_2.jpg"]);
    }

    #[tokio::test]
    async fn test_name_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = backend(&temp_dir);
        // Attempts to escape the root fail before touching the filesystem
        for name in ["../etc/passwd", "..", "a/b.png", "", "a\0b"] {
            assert!(matches!(&*backend.read(name).await.unwrap_err(), ErrorKind::InvalidName(_)));
            assert!(matches!(&*backend.write(name, b"data").await.unwrap_err(), ErrorKind::InvalidName(_)));
            assert!(matches!(&*backend.delete(name).await.unwrap_err(), ErrorKind::InvalidName(_)));
        }
    }
}
