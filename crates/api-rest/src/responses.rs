//! Response envelopes and OpenAPI schemas.

use catalog_core::{Product, RemovalWarning, Replacement, ReplacementStatus};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRes {
    pub id: String,
    pub product_name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    /// Image paths in display order.
    pub images: Vec<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

impl From<Product> for ProductRes {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            product_name: product.product_name.to_string(),
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            images: product.images,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

/// `{ message, data }` for a single product, plus removal warnings if any.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductEnvelope {
    pub message: String,
    pub data: ProductRes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProductEnvelope {
    pub fn new(message: impl Into<String>, product: Product, warnings: &[RemovalWarning]) -> Self {
        Self {
            message: message.into(),
            data: product.into(),
            warnings: warning_texts(warnings),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListEnvelope {
    pub message: String,
    pub data: Vec<ProductRes>,
}

/// Outcome of one `(index, file)` pair of a batch replace.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRes {
    pub index: i64,
    /// Path of the uploaded image for this pair.
    pub path: String,
    /// `false` when the index was out of range and the pair was skipped.
    pub applied: bool,
    /// Path the slot held before this pair was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,
}

impl From<Replacement> for ReplacementRes {
    fn from(replacement: Replacement) -> Self {
        let replaced = match replacement.status {
            ReplacementStatus::Applied { replaced } => Some(replaced),
            ReplacementStatus::Skipped => None,
        };

        Self {
            index: replacement.index,
            path: replacement.path,
            applied: replaced.is_some(),
            replaced,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplaceImagesEnvelope {
    pub message: String,
    pub data: ProductRes,
    pub replacements: Vec<ReplacementRes>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Body of responses without a product, and of 4xx errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Body of 500 responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Documents the multipart form accepted by product routes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductFormDoc {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    /// Image files; each must be `image/*`.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Option<Vec<Vec<u8>>>,
}

/// Documents the multipart form accepted by the batch replace route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReplaceImagesFormDoc {
    /// Positions to replace, one per uploaded file, in the same order.
    pub indexes: Vec<i64>,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

pub fn warning_texts(warnings: &[RemovalWarning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}
