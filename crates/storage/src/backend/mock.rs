//! In-memory storage backend for testing.

use super::{ByteStream, FileInfoStream};
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate as validate_name;
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Writes can be
/// switched off with [`fail_writes()`](Self::fail_writes) to exercise the
/// "storage unavailable" paths of callers.
///
/// # Examples
///
/// ```
/// use storefront_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("1_1718000000000.png", b"\x89PNG")]);
/// assert!(backend.exists("1_1718000000000.png").await.unwrap());
///
/// backend.write("2_1718000000001.jpg", b"data...").await.unwrap();
/// assert!(backend.exists("2_1718000000001.jpg").await.unwrap());
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    root: PathBuf,
    storage: RwLock<HashMap<String, (UtcDateTime, Vec<u8>)>>,
    unavailable: AtomicBool,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any name fails validation. If test setup is wrong, then
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = UtcDateTime::now();
        for (name, data) in files {
            let name = name.into();
            if validate_name(&name).is_err() {
                panic!("MockBackend::with_files: invalid name {name:?}");
            }
            map.insert(name, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            root: PathBuf::from("/mock"),
            storage: RwLock::new(map),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail as if the disk had gone away.
    pub fn fail_writes(&self, fail: bool) {
        self.unavailable.store(fail, Ordering::SeqCst);
    }

    /// Number of stored files.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn not_found(name: &str) -> exn::Exn<ErrorKind> {
        exn::Exn::from(ErrorKind::NotFound(name.to_string()))
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_name(name)?))
    }

    async fn ensure_root(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Unavailable(self.root.clone()));
        }
        Ok(())
    }

    fn list_stream<'a>(&'a self) -> FileInfoStream<'a> {
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding to
            // avoid holding the lock across yield points.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .map(|(name, (inserted, data))| FileInfo::new(name.clone(), data.len() as u64, *inserted))
                    .collect()
            };
            for info in entries {
                yield Ok(info);
            }
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        Ok(self.storage.read().await.contains_key(name))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let name = validate_name(name)?;
        let (_inserted, data) = self.storage.read().await.get(name).cloned().ok_or_else(|| Self::not_found(name))?;
        Ok(data)
    }

    async fn stream(&self, name: &str) -> Result<ByteStream> {
        let data = self.read(name).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) })))
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let name = validate_name(name)?;
        if self.unavailable.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Unavailable(self.root.clone()));
        }
        self.storage.write().await.insert(name.to_string(), (UtcDateTime::now(), data.to_vec()));
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.storage.write().await.remove(name).map(|_| ()).ok_or_else(|| Self::not_found(name))
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        let name = validate_name(name)?;
        let guard = self.storage.read().await;
        let (inserted, data) = guard.get(name).ok_or_else(|| Self::not_found(name))?;
        Ok(FileInfo::new(name, data.len() as u64, *inserted))
    }
}
