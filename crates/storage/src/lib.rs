//! Flat-directory blob storage for uploaded images.
//!
//! Every stored object is addressed by a single file name (no directories)
//! relative to the backend root. Names are validated with
//! [`validate_name`] before any backend touches the filesystem, so a name
//! coming from a URL can never escape the root.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::{ByteStream, StorageBackend};
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_name;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
