use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::name::{Extension, stored_name};
use exn::ResultExt;
use storefront_catalog::{ImageRef, Repository};
use storefront_config::Retention;
use storefront_storage::BackendHandle;
use tracing::instrument;

/// A stored upload.
///
/// Returned whenever the bytes reached the image directory, whether or not
/// the product row could be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Public reference to the stored file (`public_prefix` + `name`).
    pub reference: String,
    /// Generated name the file was stored under.
    pub name: String,
    pub association: Association,
}

/// What happened when recording the upload against its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// The product now points at the upload. `previous` is the image it
    /// pointed at before, if any.
    Associated { previous: Option<ImageRef> },
    /// No product has that id; the file is stored but unreferenced.
    ProductMissing,
    /// The catalog could not be updated; the file is stored but unreferenced.
    Failed,
}

/// Store an uploaded image and point the product at it.
///
/// The file is written before the catalog is touched. Updating the product
/// is best-effort: a missing product or a database failure is reported in
/// [`Upload::association`] and does not fail the upload.
///
/// # Errors
/// - [`MalformedFilename`](ErrorKind::MalformedFilename) if no extension can
///   be taken from `filename`. Nothing is written.
/// - [`StorageUnavailable`](ErrorKind::StorageUnavailable) if the image
///   directory cannot be (re)created or the file could not be written. The
///   catalog is not touched.
#[instrument(skip(backend, catalog, ctx, data), fields(backend = backend.name(), bytes = data.len()))]
pub async fn upload(
    backend: &BackendHandle,
    catalog: &Repository,
    ctx: &Context,
    product_id: i64,
    filename: &str,
    data: &[u8],
) -> Result<Upload> {
    let extension = Extension::from_filename(filename)?;
    let name = stored_name(product_id, &extension);
    // The directory may have been removed since startup.
    backend.ensure_root().await.or_raise(|| ErrorKind::StorageUnavailable)?;
    backend.write(&name, data).await.or_raise(|| ErrorKind::StorageUnavailable)?;
    tracing::info!(product_id, name = %name, bytes = data.len(), "stored uploaded image");

    let reference = format!("{}{name}", ctx.public_prefix);
    let association = associate(backend, catalog, ctx, product_id, filename, &name, &reference).await;
    Ok(Upload { reference, name, association })
}

async fn associate(
    backend: &BackendHandle,
    catalog: &Repository,
    ctx: &Context,
    product_id: i64,
    filename: &str,
    name: &str,
    reference: &str,
) -> Association {
    let path = match backend.locate(name) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(product_id, name, error = ?e, "could not resolve stored image path");
            return Association::Failed;
        },
    };
    let image = ImageRef { url: reference.to_string(), filename: filename.to_string(), path };
    match catalog.associate_image(product_id, &image).await {
        Ok(Some(previous)) => {
            if ctx.retention == Retention::Replace
                && let Some(previous) = &previous
                && previous.path != image.path
            {
                discard(backend, previous).await;
            }
            Association::Associated { previous }
        },
        Ok(None) => {
            tracing::warn!(product_id, name, "no such product; uploaded image left unassociated");
            Association::ProductMissing
        },
        Err(e) => {
            tracing::warn!(product_id, name, error = ?e, "could not associate uploaded image with product");
            Association::Failed
        },
    }
}

/// Delete a superseded upload. Failures are logged and otherwise ignored;
/// the file can still be removed by pruning.
async fn discard(backend: &BackendHandle, previous: &ImageRef) {
    let Some(name) = previous.path.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    // Only delete files that actually live in this image directory.
    match backend.locate(name) {
        Ok(path) if path == previous.path => (),
        _ => {
            tracing::debug!(path = %previous.path.display(), "superseded image is outside the image directory; kept");
            return;
        },
    }
    match backend.delete(name).await {
        Ok(()) => tracing::info!(name, "deleted superseded image"),
        Err(e) => tracing::warn!(name, error = ?e, "could not delete superseded image"),
    }
}
