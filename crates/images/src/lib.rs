//! Image workflows: upload and association, retrieval, and orphan pruning.
//!
//! Uploads are written to the image directory first and recorded against
//! their product afterwards. The second step is best-effort, so the directory
//! may hold files that no product refers to; [`prune`] finds and removes
//! them.
//!
//! The entry points take the storage backend and the catalog explicitly,
//! alongside a [`Context`] holding the settings that apply to every upload.

pub mod error;
mod fetch;
mod format;
mod name;
mod prune;
mod upload;

pub use crate::fetch::{Image, fetch};
pub use crate::format::MediaType;
pub use crate::name::{Extension, stored_name};
pub use crate::prune::{PruneEvent, prune};
pub use crate::upload::{Association, Upload, upload};
use storefront_config::{ImagesConfig, Retention};

/// Settings shared by every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Prepended to a stored name to form its public reference.
    pub public_prefix: String,
    pub retention: Retention,
}
impl From<&ImagesConfig> for Context {
    fn from(config: &ImagesConfig) -> Self {
        Self { public_prefix: config.public_prefix.clone(), retention: config.retention }
    }
}
