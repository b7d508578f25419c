//! Storage models.

use time::UtcDateTime;

/// File metadata returned by storage backends.
///
/// Used for retrieval (content length) and for listing the directory when
/// looking for files no product references anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Name of the file within the storage root
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, modified: UtcDateTime) -> Self {
        Self { name: name.into(), size, modified }
    }
}
