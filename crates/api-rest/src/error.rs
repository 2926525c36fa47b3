//! HTTP error mapping.
//!
//! Client errors are returned as `{ "message": ... }` with a 4xx status. Anything else is
//! logged and returned as `{ "error": ... }` with 500.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::{CatalogError, FilesError};
use serde_json::json;

pub const PRODUCT_NOT_FOUND: &str = "Product not found!";
pub const INVALID_IMAGE_INDEX: &str = "Invalid image index!";
pub const INDEX_COUNT_MISMATCH: &str = "Indexes count must match uploaded files count";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Malformed path parameter or form field.
    #[error("{0}")]
    BadRequest(String),
    /// Upload rejected during extraction.
    #[error("{0}")]
    BadUpload(String),
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::UnsupportedMediaType(_)
            | FilesError::FileTooLarge { .. }
            | FilesError::TooManyFiles(_) => ApiError::BadUpload(err.to_string()),
            other => ApiError::Catalog(CatalogError::Files(other)),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadUpload(err.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn client_message(&self) -> Option<(StatusCode, String)> {
        let bad_request = |message: String| Some((StatusCode::BAD_REQUEST, message));

        match self {
            ApiError::BadRequest(message) | ApiError::BadUpload(message) => {
                bad_request(message.clone())
            }
            ApiError::Catalog(err) => match err {
                CatalogError::NotFound(_) => {
                    Some((StatusCode::NOT_FOUND, PRODUCT_NOT_FOUND.to_string()))
                }
                CatalogError::Conflict(_) => Some((StatusCode::CONFLICT, err.to_string())),
                CatalogError::InvalidIndex { .. } => bad_request(INVALID_IMAGE_INDEX.to_string()),
                CatalogError::CountMismatch { .. } => {
                    bad_request(INDEX_COUNT_MISMATCH.to_string())
                }
                CatalogError::InvalidInput(message) => bad_request(message.clone()),
                CatalogError::Id(_) | CatalogError::Text(_) => bad_request(err.to_string()),
                CatalogError::Files(
                    FilesError::UnsupportedMediaType(_)
                    | FilesError::FileTooLarge { .. }
                    | FilesError::TooManyFiles(_),
                ) => bad_request(err.to_string()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.client_message() {
            Some((status, message)) => {
                tracing::debug!(%status, %message, "request rejected");
                (status, Json(json!({ "message": message }))).into_response()
            }
            None => {
                tracing::error!("request failed: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
