//! Repository for products and their image associations.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ImageRef, ImageRow, NewProduct, Product, ProductRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::PathBuf;

/// Queries over the `products` table.
///
/// Every operation is a single statement, except
/// [`associate_image()`](Self::associate_image) which runs a read and an
/// update inside one transaction.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        rows.into_iter().map(Product::try_from).collect()
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Every product, ordered by id.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(include_str!("../queries/list_products.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::into_products(rows)
    }

    /// A single product by id.
    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(include_str!("../queries/get_product.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Product::try_from).transpose()
    }

    /// Products whose category equals `category` exactly (case-sensitive).
    pub async fn list_by_category(&self, category: impl AsRef<str>) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(include_str!("../queries/list_products_by_category.sql"))
            .bind(category.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::into_products(rows)
    }

    /// Every stored-file path currently referenced by a product.
    pub async fn referenced_images(&self) -> Result<HashSet<PathBuf>> {
        let rows: Vec<(String,)> = sqlx::query_as(include_str!("../queries/referenced_images.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(|(path,)| PathBuf::from(path)).collect())
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Store a new product. The id is assigned by the database.
    pub async fn insert(&self, product: &NewProduct) -> Result<Product> {
        let row: ProductRow = sqlx::query_as(include_str!("../queries/insert_product.sql"))
            .bind(&product.name)
            .bind(&product.category)
            .bind(&product.image)
            .bind(product.price)
            .bind(product.original_price)
            .bind(product.rating)
            .bind(product.reviews.map(i64::from))
            .bind(product.featured)
            .bind(product.in_stock)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let product = Product::try_from(row)?;
        tracing::debug!(product_id = product.id, name = %product.name, "inserted product");
        Ok(product)
    }

    /// Overwrite the image association of a product.
    ///
    /// Returns `None` if no product has that id, in which case nothing is
    /// written. Otherwise returns the association that was replaced, if the
    /// product had one.
    pub async fn associate_image(&self, id: i64, image: &ImageRef) -> Result<Option<Option<ImageRef>>> {
        let new = ImageRow::try_from(image)?;
        // Take the write lock up front: a deferred transaction that reads first
        // cannot upgrade once another writer has committed, and fails with
        // SQLITE_BUSY without waiting for the busy timeout.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await.or_raise(|| ErrorKind::Database)?;
        let current: Option<ImageRow> = sqlx::query_as(include_str!("../queries/get_image.sql"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(current) = current else {
            // Dropping the transaction rolls it back; nothing was written.
            return Ok(None);
        };
        let previous = current.into_image_ref()?;
        sqlx::query(include_str!("../queries/update_image.sql"))
            .bind(new.image_url)
            .bind(new.image_filename)
            .bind(new.image_path)
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(Some(previous))
    }
}
