//! Request body extraction for product forms.
//!
//! Product routes accept `multipart/form-data`: image parts arrive in the `images` field and
//! every other part is read as text. Each image is checked (media type, size, count) and
//! written to the upload directory as soon as it has been read, so handlers receive
//! [`StoredImage`]s. If extraction fails part-way, the images already written for the request
//! are removed before the error is returned.
//!
//! A JSON object body is accepted as well for requests that carry no files. A request without
//! a body yields an empty form.

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use catalog_core::{FilesError, ImageFiles, ProductFields, StoredImage};
use serde_json::{Map, Value};

/// Multipart field that carries image files.
pub const IMAGES_FIELD: &str = "images";

#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: ProductFields,
    /// Raw `indexes` values in arrival order; `None` if the field was never sent.
    pub indexes: Option<Vec<String>>,
    pub files: Vec<StoredImage>,
}

/// A [`ProductForm`] limited to a single image.
#[derive(Debug)]
pub struct SingleImageForm(pub ProductForm);

impl ProductForm {
    async fn extract(req: Request, state: &AppState, max_files: usize) -> ApiResult<Self> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadUpload(rejection.body_text()))?;
            read_multipart(multipart, state.service.files(), max_files).await
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            from_json(body)
        } else {
            Ok(Self::default())
        }
    }

    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "productName" => self.fields.product_name = Some(value),
            "description" => self.fields.description = Some(value),
            "price" => self.fields.price = Some(value),
            "quantity" => self.fields.quantity = Some(value),
            "indexes" | "indexes[]" => self.indexes.get_or_insert_with(Vec::new).push(value),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    /// Removes the uploaded images; used when the request is rejected after extraction.
    pub fn discard(&self, files: &ImageFiles) {
        files.discard(&self.files);
    }
}

#[async_trait]
impl FromRequest<AppState> for ProductForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::extract(req, state, state.cfg.max_files()).await
    }
}

#[async_trait]
impl FromRequest<AppState> for SingleImageForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        ProductForm::extract(req, state, 1).await.map(Self)
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    files: &ImageFiles,
    max_files: usize,
) -> ApiResult<ProductForm> {
    let mut form = ProductForm::default();

    match read_parts(&mut multipart, files, max_files, &mut form).await {
        Ok(()) => Ok(form),
        Err(err) => {
            form.discard(files);
            Err(err)
        }
    }
}

async fn read_parts(
    multipart: &mut Multipart,
    files: &ImageFiles,
    max_files: usize,
    form: &mut ProductForm,
) -> ApiResult<()> {
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_none() {
            let value = field.text().await?;
            form.set_text(&name, value);
            continue;
        }

        if name != IMAGES_FIELD {
            return Err(ApiError::BadUpload(format!("Unexpected file field '{name}'")));
        }
        if form.files.len() >= max_files {
            return Err(FilesError::TooManyFiles(max_files).into());
        }

        let mimetype = field.content_type().unwrap_or_default().to_string();
        ImageFiles::check_mimetype(&mimetype)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            bytes.extend_from_slice(&chunk);
            files.check_size(bytes.len() as u64)?;
        }

        let stored = files.persist(&mimetype, &bytes)?;
        tracing::debug!(path = %stored.path, size = bytes.len(), "stored upload");
        form.files.push(stored);
    }

    Ok(())
}

fn from_json(body: Map<String, Value>) -> ApiResult<ProductForm> {
    let mut form = ProductForm::default();

    for (name, value) in body {
        match value {
            Value::Null => {}
            Value::String(text) => form.set_text(&name, text),
            Value::Number(number) => form.set_text(&name, number.to_string()),
            Value::Array(_) if name == "indexes" => form.set_text(&name, value.to_string()),
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "field '{name}' must be a string or a number"
                )))
            }
        }
    }

    Ok(form)
}

/// Parses raw `indexes` values. Each value may be a single integer, a comma separated list or
/// a JSON array; values are concatenated in arrival order.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for anything that is not an integer.
pub fn parse_indexes(raw: &[String]) -> ApiResult<Vec<i64>> {
    let invalid = |value: &str| ApiError::BadRequest(format!("indexes must be integers, got '{value}'"));
    let mut indexes = Vec::new();

    for value in raw {
        let value = value.trim();

        if value.starts_with('[') {
            let parsed: Vec<i64> = serde_json::from_str(value).map_err(|_| invalid(value))?;
            indexes.extend(parsed);
            continue;
        }

        for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            indexes.push(part.parse().map_err(|_| invalid(part))?);
        }
    }

    Ok(indexes)
}
