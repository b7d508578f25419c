use crate::AppState;
use crate::response::ApiError;
use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const UPLOAD_MESSAGE: &str = "Image uploaded successfully";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadResponse {
    image_url: String,
    message: &'static str,
}

/// `POST /api/images/upload`, multipart with `file` and `productId`.
pub(crate) async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut product_id: Option<i64> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("file part has no filename"))?;
                file = Some((filename, field.bytes().await?));
            },
            Some("productId") => {
                let text = field.text().await?;
                let id = text.trim().parse().map_err(|_| ApiError::bad_request("productId must be an integer"))?;
                product_id = Some(id);
            },
            // Unknown parts are ignored.
            _ => (),
        }
    }
    let (filename, data) = file.ok_or_else(|| ApiError::bad_request("missing file part"))?;
    let product_id = product_id.ok_or_else(|| ApiError::bad_request("missing productId part"))?;

    let upload =
        storefront_images::upload(&state.backend, &state.catalog, &state.images, product_id, &filename, &data).await?;
    tracing::debug!(product_id, name = %upload.name, association = ?upload.association, "upload handled");
    Ok(Json(UploadResponse { image_url: upload.reference, message: UPLOAD_MESSAGE }))
}

/// `GET /api/images/{filename}`
pub(crate) async fn fetch(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response, ApiError> {
    let image = storefront_images::fetch(&state.backend, &filename).await?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(image.media_type.as_str())),
        (header::CONTENT_LENGTH, HeaderValue::from(image.size)),
    ];
    Ok((headers, Body::from_stream(image.body)).into_response())
}
