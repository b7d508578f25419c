use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The uploaded image associated with a product.
///
/// The three fields are always written together; a product either has all of
/// them or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Public reference served by the retrieval endpoint.
    pub url: String,
    /// Filename as supplied by the client.
    pub filename: String,
    /// Where the stored file lives on disk.
    pub path: PathBuf,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "ProductJson")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Placeholder image URL supplied when the product was created.
    pub image: Option<String>,
    pub price: f64,
    pub original_price: Option<f64>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub featured: bool,
    pub in_stock: bool,
    pub upload: Option<ImageRef>,
}

/// A product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "in_stock_by_default")]
    pub in_stock: bool,
}

fn in_stock_by_default() -> bool {
    true
}

/// Wire shape of a [`Product`]: flat camelCase with explicit nulls.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductJson {
    id: i64,
    name: String,
    category: String,
    image: Option<String>,
    price: f64,
    original_price: Option<f64>,
    rating: Option<f64>,
    reviews: Option<u32>,
    featured: bool,
    in_stock: bool,
    image_url: Option<String>,
    image_filename: Option<String>,
    image_path: Option<String>,
}
impl From<Product> for ProductJson {
    fn from(p: Product) -> Self {
        let (image_url, image_filename, image_path) = match p.upload {
            Some(r) => (Some(r.url), Some(r.filename), Some(r.path.to_string_lossy().into_owned())),
            None => (None, None, None),
        };
        Self {
            id: p.id,
            name: p.name,
            category: p.category,
            image: p.image,
            price: p.price,
            original_price: p.original_price,
            rating: p.rating,
            reviews: p.reviews,
            featured: p.featured,
            in_stock: p.in_stock,
            image_url,
            image_filename,
            image_path,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    category: String,
    image: Option<String>,
    price: f64,
    original_price: Option<f64>,
    rating: Option<f64>,
    reviews: Option<i64>,
    featured: bool,
    in_stock: bool,
    #[sqlx(flatten)]
    upload: ImageRow,
}
impl TryFrom<ProductRow> for Product {
    type Error = Error;
    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            category: row.category,
            image: row.image,
            price: row.price,
            original_price: row.original_price,
            rating: row.rating,
            reviews: row
                .reviews
                .map(u32::try_from)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("review count"))?,
            featured: row.featured,
            in_stock: row.in_stock,
            upload: row.upload.into_image_ref()?,
        })
    }
}

/// The three image columns of a product row.
#[derive(sqlx::FromRow, Default)]
pub(crate) struct ImageRow {
    pub(crate) image_url: Option<String>,
    pub(crate) image_filename: Option<String>,
    pub(crate) image_path: Option<String>,
}
impl TryFrom<&ImageRef> for ImageRow {
    type Error = Error;
    fn try_from(r: &ImageRef) -> Result<Self, Self::Error> {
        Ok(Self {
            image_url: Some(r.url.clone()),
            image_filename: Some(r.filename.clone()),
            image_path: Some(r.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("image path"))?.to_string()),
        })
    }
}
impl ImageRow {
    /// `None` if the product has no association, an error if it is partial.
    pub(crate) fn into_image_ref(self) -> Result<Option<ImageRef>, Error> {
        match (self.image_url, self.image_filename, self.image_path) {
            (Some(url), Some(filename), Some(path)) => Ok(Some(ImageRef { url, filename, path: PathBuf::from(path) })),
            (None, None, None) => Ok(None),
            _ => exn::bail!(ErrorKind::InvalidData("partial image association")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn row(upload: ImageRow) -> ProductRow {
        ProductRow {
            id: 7,
            name: "Linen Shirt".to_string(),
            category: "clothing".to_string(),
            image: Some("https://cdn.example.com/shirt.jpg".to_string()),
            price: 39.5,
            original_price: None,
            rating: Some(4.5),
            reviews: Some(12),
            featured: true,
            in_stock: false,
            upload,
        }
    }

    #[test]
    fn test_row_to_model() {
        let product = Product::try_from(row(ImageRow::default())).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.reviews, Some(12));
        assert!(product.featured);
        assert!(!product.in_stock);
        assert_eq!(product.upload, None);
    }

    #[test]
    fn test_row_with_image() {
        let upload = ImageRow {
            image_url: Some("/api/images/7_1.png".to_string()),
            image_filename: Some("shirt.png".to_string()),
            image_path: Some("/srv/uploads/images/7_1.png".to_string()),
        };
        let product = Product::try_from(row(upload)).unwrap();
        let upload = product.upload.unwrap();
        assert_eq!(upload.url, "/api/images/7_1.png");
        assert_eq!(upload.filename, "shirt.png");
        assert_eq!(upload.path, PathBuf::from("/srv/uploads/images/7_1.png"));
    }

    #[rstest]
    #[case(Some("/api/images/7_1.png"), None, None)]
    #[case(None, Some("shirt.png"), None)]
    #[case(Some("/api/images/7_1.png"), Some("shirt.png"), None)]
    #[case(None, None, Some("/srv/7_1.png"))]
    fn test_partial_image_rejected(
        #[case] url: Option<&str>,
        #[case] filename: Option<&str>,
        #[case] path: Option<&str>,
    ) {
        let upload = ImageRow {
            image_url: url.map(String::from),
            image_filename: filename.map(String::from),
            image_path: path.map(String::from),
        };
        let err = Product::try_from(row(upload)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[test]
    fn test_negative_reviews_rejected() {
        let mut bad = row(ImageRow::default());
        bad.reviews = Some(-1);
        assert!(Product::try_from(bad).is_err());
    }

    #[test]
    fn test_json_shape() {
        let product = Product::try_from(row(ImageRow::default())).unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "name": "Linen Shirt",
                "category": "clothing",
                "image": "https://cdn.example.com/shirt.jpg",
                "price": 39.5,
                "originalPrice": null,
                "rating": 4.5,
                "reviews": 12,
                "featured": true,
                "inStock": false,
                "imageUrl": null,
                "imageFilename": null,
                "imagePath": null,
            })
        );
    }

    #[test]
    fn test_new_product_defaults() {
        let new: NewProduct = serde_json::from_value(json!({
            "name": "Mug",
            "category": "kitchen",
            "price": 8.0,
        }))
        .unwrap();
        assert!(!new.featured);
        assert!(new.in_stock);
        assert_eq!(new.image, None);
        assert_eq!(new.reviews, None);
    }

    #[test]
    fn test_new_product_camel_case() {
        let new: NewProduct = serde_json::from_value(json!({
            "name": "Mug",
            "category": "kitchen",
            "price": 8.0,
            "originalPrice": 10.0,
            "inStock": false,
        }))
        .unwrap();
        assert_eq!(new.original_price, Some(10.0));
        assert!(!new.in_stock);
    }
}
