mod product;

pub use self::product::{ImageRef, NewProduct, Product};
pub(crate) use self::product::{ImageRow, ProductRow};
