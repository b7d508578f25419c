//! SQLite product catalog.
//!
//! This crate owns the `products` table: the read queries behind the catalog
//! endpoints, seeding new products, and the single-row update that records
//! an uploaded image against a product.
//!
//! # Image Association
//! A product carries at most one uploaded image, described by an
//! [`ImageRef`]: the public URL, the client's original filename and the path
//! of the stored file. The three columns are written together and the schema
//! refuses a row where only some of them are set.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{ImageRef, NewProduct, Product};
pub use crate::repo::Repository;
