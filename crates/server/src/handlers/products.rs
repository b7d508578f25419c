use crate::AppState;
use crate::response::ApiError;
use axum::Json;
use axum::extract::{Path, State};
use storefront_catalog::Product;

/// `GET /products`
pub(crate) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_all().await?))
}

/// `GET /products/{id}`
pub(crate) async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Product>, ApiError> {
    state.catalog.get(id).await?.map(Json).ok_or(ApiError::NotFound)
}

/// `GET /products/category/{category}`
///
/// A category without products is reported as not found rather than as an
/// empty list; the storefront frontend relies on it.
pub(crate) async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.catalog.list_by_category(&category).await?;
    if products.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(products))
}
