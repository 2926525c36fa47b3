//! Route handlers.
//!
//! Each handler validates its path parameters, delegates to [`catalog_core::ProductService`]
//! and wraps the outcome in a response envelope. Uploads have already been written by the
//! form extractor, so a handler that rejects the request itself must discard them.

use crate::error::{ApiError, ApiResult, INVALID_IMAGE_INDEX};
use crate::responses::{
    warning_texts, ErrorRes, HealthRes, MessageRes, ProductEnvelope, ProductFormDoc,
    ProductListEnvelope, ProductRes, ReplaceImagesEnvelope, ReplaceImagesFormDoc,
};
use crate::upload::{parse_indexes, ProductForm, SingleImageForm};
use crate::{ApiDoc, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use catalog_core::CatalogError;
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness check.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Catalog REST API is alive".into(),
    })
}

/// Serves the generated OpenAPI document.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/product",
    request_body(content = ProductFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ProductEnvelope),
        (status = 400, description = "Invalid input or upload", body = MessageRes),
        (status = 409, description = "Product name already exists", body = MessageRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Creates a product whose images are the uploaded files, in upload order.
#[axum::debug_handler]
pub async fn add_product(
    State(state): State<AppState>,
    form: ProductForm,
) -> ApiResult<(StatusCode, Json<ProductEnvelope>)> {
    let product = state.service.add(&form.fields, form.files)?;

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope::new(
            "Product added successfully",
            product,
            &[],
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/product",
    responses(
        (status = 200, description = "Every product", body = ProductListEnvelope),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<ProductListEnvelope>> {
    let products = state.service.list()?;

    Ok(Json(ProductListEnvelope {
        message: format!("All products available totalled: {}", products.len()),
        data: products.into_iter().map(ProductRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductEnvelope),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductEnvelope>> {
    let product = state.service.get(&id)?;
    Ok(Json(ProductEnvelope::new("Product found", product, &[])))
}

#[utoipa::path(
    put,
    path = "/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body(content = ProductFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ProductEnvelope),
        (status = 400, description = "Invalid input or upload", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
/// Updates the present fields. Uploaded files, if any, replace every existing image.
#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: ProductForm,
) -> ApiResult<Json<ProductEnvelope>> {
    let mutation = state.service.update(&id, &form.fields, form.files)?;

    Ok(Json(ProductEnvelope::new(
        "Product updated successfully",
        mutation.product,
        &mutation.warnings,
    )))
}

#[utoipa::path(
    delete,
    path = "/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product and its images deleted", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageRes>> {
    let warnings = state.service.delete(&id)?;

    Ok(Json(MessageRes {
        message: "Product deleted successfully".into(),
        warnings: warning_texts(&warnings),
    }))
}

#[utoipa::path(
    put,
    path = "/product/{id}/images",
    params(("id" = String, Path, description = "Product id")),
    request_body(content = ProductFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images appended", body = ProductEnvelope),
        (status = 400, description = "Invalid input or upload", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
/// Appends the uploaded images after the existing ones.
#[axum::debug_handler]
pub async fn append_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: ProductForm,
) -> ApiResult<Json<ProductEnvelope>> {
    let mutation = state.service.append_images(&id, &form.fields, form.files)?;

    Ok(Json(ProductEnvelope::new(
        "Product updated successfully",
        mutation.product,
        &mutation.warnings,
    )))
}

#[utoipa::path(
    put,
    path = "/product/{id}/images/{index}",
    params(
        ("id" = String, Path, description = "Product id"),
        ("index" = i64, Path, description = "Zero-based image position")
    ),
    request_body(content = ProductFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image replaced", body = ProductEnvelope),
        (status = 400, description = "Invalid index or upload", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
/// Replaces the image at `index` with the single uploaded file.
#[axum::debug_handler]
pub async fn replace_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
    SingleImageForm(form): SingleImageForm,
) -> ApiResult<Json<ProductEnvelope>> {
    let index = or_discard(&state, &form, parse_index(&index))?;

    let Some(upload) = form.files.into_iter().next() else {
        return Err(ApiError::BadUpload("An image file is required".into()));
    };
    let mutation = state.service.replace_image(&id, index, upload)?;

    Ok(Json(ProductEnvelope::new(
        "Image replaced successfully",
        mutation.product,
        &mutation.warnings,
    )))
}

#[utoipa::path(
    put,
    path = "/product/{id}/images/indexes",
    params(("id" = String, Path, description = "Product id")),
    request_body(content = ReplaceImagesFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Selected images replaced", body = ReplaceImagesEnvelope),
        (status = 400, description = "Index count mismatch or invalid upload", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
/// Replaces the image at each `indexes[i]` with the i-th uploaded file.
///
/// Out-of-range pairs are skipped and reported with `applied: false`.
#[axum::debug_handler]
pub async fn replace_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: ProductForm,
) -> ApiResult<Json<ReplaceImagesEnvelope>> {
    let indexes = match form.indexes.as_deref() {
        Some(raw) => or_discard(&state, &form, parse_indexes(raw))?,
        None => {
            form.discard(state.service.files());
            return Err(CatalogError::CountMismatch {
                indexes: 0,
                files: form.files.len(),
            }
            .into());
        }
    };

    let batch = state.service.replace_images(&id, &indexes, form.files)?;

    Ok(Json(ReplaceImagesEnvelope {
        message: "Selected images replaced successfully".into(),
        replacements: batch.replacements.into_iter().map(Into::into).collect(),
        warnings: warning_texts(&batch.mutation.warnings),
        data: batch.mutation.product.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/product/{id}/images/{index}",
    params(
        ("id" = String, Path, description = "Product id"),
        ("index" = i64, Path, description = "Zero-based image position")
    ),
    responses(
        (status = 200, description = "Image deleted", body = ProductEnvelope),
        (status = 400, description = "Invalid index", body = MessageRes),
        (status = 404, description = "Product not found", body = MessageRes)
    )
)]
/// Deletes the image at `index`; later images shift down by one.
#[axum::debug_handler]
pub async fn delete_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> ApiResult<Json<ProductEnvelope>> {
    let index = parse_index(&index)?;
    let mutation = state.service.delete_image(&id, index)?;

    Ok(Json(ProductEnvelope::new(
        "Image deleted successfully",
        mutation.product,
        &mutation.warnings,
    )))
}

fn parse_index(segment: &str) -> ApiResult<i64> {
    segment
        .parse()
        .map_err(|_| ApiError::BadRequest(INVALID_IMAGE_INDEX.into()))
}

fn or_discard<T>(state: &AppState, form: &ProductForm, result: ApiResult<T>) -> ApiResult<T> {
    if result.is_err() {
        form.discard(state.service.files());
    }
    result
}
