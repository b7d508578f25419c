//! HTTP API for the storefront.
//!
//! | Route                               | Handler                                     |
//! |-------------------------------------|---------------------------------------------|
//! | `POST /api/images/upload`           | store an image and attach it to a product   |
//! | `GET {public_prefix}{filename}`     | stream a stored image                       |
//! | `GET /products`                     | every product                               |
//! | `GET /products/{id}`                | one product                                 |
//! | `GET /products/category/{category}` | products in a category                      |
//! | `GET /health`                       | liveness                                    |
//!
//! The public prefix defaults to `/api/images/`.

pub mod error;
mod handlers;
mod response;

use crate::error::{ErrorKind, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use exn::ResultExt;
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_catalog::Repository;
use storefront_config::ServerConfig;
use storefront_images::Context;
use storefront_storage::BackendHandle;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Everything a request handler needs, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendHandle,
    pub catalog: Repository,
    pub images: Arc<Context>,
}

/// Prefixes whose retrieval route would collide with a catalog route.
const RESERVED_PREFIXES: [&str; 2] = ["/products/", "/products/category/"];

/// Build the application router.
///
/// Stored images are served under the configured public prefix, so every
/// reference handed out by an upload can be fetched as-is.
pub fn router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let image_route = image_route(&state.images.public_prefix)?;
    Ok(Router::new()
        .route("/api/images/upload", post(handlers::images::upload))
        .route(&image_route, get(handlers::images::fetch))
        .route("/products", get(handlers::products::list))
        .route("/products/{id}", get(handlers::products::get))
        .route("/products/category/{category}", get(handlers::products::by_category))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors(&config.cors_origins)?)
        .with_state(state))
}

fn image_route(prefix: &str) -> Result<String> {
    if RESERVED_PREFIXES.contains(&prefix) || prefix.contains(['{', '}', '*']) {
        exn::bail!(ErrorKind::InvalidPrefix(prefix.to_string()));
    }
    Ok(format!("{prefix}{{filename}}"))
}

fn cors(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin).or_raise(|| ErrorKind::InvalidOrigin(origin.clone())))
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

/// Serve the API until `shutdown` resolves, then finish in-flight requests.
pub async fn serve(
    state: AppState,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state, config)?;
    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr).await.or_raise(|| ErrorKind::Bind(addr))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await.or_raise(|| ErrorKind::Serve)
}
