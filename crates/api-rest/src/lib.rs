//! # Catalog REST API
//!
//! HTTP surface of the product catalog.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Multipart upload extraction into the upload directory
//! - Response envelopes and error mapping
//! - OpenAPI documentation (served as JSON at `/api-docs/openapi.json`)
//!
//! All product logic lives in `catalog-core`; this crate only translates between HTTP and
//! [`ProductService`].

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;
pub mod responses;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use catalog_core::{CatalogResult, CoreConfig, ProductService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use error::{ApiError, ApiResult};

/// Multipart framing allowance on top of the image payload.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Shared state for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: ProductService,
    pub cfg: Arc<CoreConfig>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the upload directory is unusable.
    pub fn new(cfg: Arc<CoreConfig>) -> CatalogResult<Self> {
        Ok(Self {
            service: ProductService::new(cfg.clone())?,
            cfg,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::add_product,
        handlers::list_products,
        handlers::get_product,
        handlers::update_product,
        handlers::delete_product,
        handlers::append_images,
        handlers::replace_image,
        handlers::replace_images,
        handlers::delete_image,
    ),
    components(schemas(
        responses::HealthRes,
        responses::ProductRes,
        responses::ProductEnvelope,
        responses::ProductListEnvelope,
        responses::ReplacementRes,
        responses::ReplaceImagesEnvelope,
        responses::MessageRes,
        responses::ErrorRes,
        responses::ProductFormDoc,
        responses::ReplaceImagesFormDoc,
    ))
)]
pub struct ApiDoc;

/// Builds the application router.
///
/// The request body limit covers `max_files` images of `max_file_size` each; the extractor
/// enforces the per-file limits itself.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.cfg.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_mul(state.cfg.max_files())
        .saturating_add(BODY_OVERHEAD);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(handlers::openapi))
        .route(
            "/product",
            post(handlers::add_product).get(handlers::list_products),
        )
        .route(
            "/product/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/product/:id/images", put(handlers::append_images))
        .route(
            "/product/:id/images/indexes",
            put(handlers::replace_images),
        )
        .route(
            "/product/:id/images/:index",
            put(handlers::replace_image).delete(handlers::delete_image),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
