use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storefront_catalog::error::Error as CatalogError;
use storefront_images::error::{Error as ImageError, ErrorKind as ImageErrorKind};

/// Failure of a single request.
///
/// Server-side failures are logged where they are converted and answered
/// with an empty body.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound,
    Internal,
    /// Status chosen by an extractor, e.g. an oversized body.
    Status(StatusCode),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            },
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            ApiError::Status(status) => status.into_response(),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match &*err {
            kind @ ImageErrorKind::MalformedFilename(_) => ApiError::BadRequest(kind.to_string()),
            ImageErrorKind::NotFound(_) => ApiError::NotFound,
            _ => {
                tracing::error!(error = ?err, "image request failed");
                ApiError::Internal
            },
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        tracing::error!(error = ?err, "catalog query failed");
        ApiError::Internal
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::BAD_REQUEST => ApiError::BadRequest(err.body_text()),
            status => ApiError::Status(status),
        }
    }
}
