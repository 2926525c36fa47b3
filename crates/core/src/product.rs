//! Product records and field-level input handling.
//!
//! Form submissions arrive as loosely typed text ([`ProductFields`]). They are parsed into
//! either a [`NewProduct`] (all required fields present) or a [`ProductUpdate`] where every
//! field is present-or-absent:
//!
//! - absent: keep the stored value
//! - present: set the value; an empty `description` clears it
//!
//! An empty `productName`, or an empty/non-numeric `price` or `quantity`, is rejected instead of
//! being silently treated as "unchanged".

use crate::{CatalogError, CatalogResult, NonEmptyText, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub product_name: NonEmptyText,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    /// Image paths in display order. Index-based operations address this exact order.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw text fields as submitted with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_name: NonEmptyText,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
}

impl NewProduct {
    /// Validates create input. `productName`, `price` and `quantity` are required.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidInput`] naming the first missing or malformed field.
    pub fn parse(fields: &ProductFields) -> CatalogResult<Self> {
        let product_name = fields
            .product_name
            .as_deref()
            .ok_or_else(|| CatalogError::InvalidInput("productName is required".into()))?;
        let price = fields
            .price
            .as_deref()
            .ok_or_else(|| CatalogError::InvalidInput("price is required".into()))?;
        let quantity = fields
            .quantity
            .as_deref()
            .ok_or_else(|| CatalogError::InvalidInput("quantity is required".into()))?;

        Ok(Self {
            product_name: parse_name(product_name)?,
            description: fields.description.clone().unwrap_or_default(),
            price: parse_price(price)?,
            quantity: parse_quantity(quantity)?,
        })
    }
}

/// Partial update: each `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub product_name: Option<NonEmptyText>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    /// Validates update input.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidInput`] for a present but empty name, or a present but
    /// malformed price or quantity.
    pub fn parse(fields: &ProductFields) -> CatalogResult<Self> {
        Ok(Self {
            product_name: fields.product_name.as_deref().map(parse_name).transpose()?,
            description: fields.description.clone(),
            price: fields.price.as_deref().map(parse_price).transpose()?,
            quantity: fields.quantity.as_deref().map(parse_quantity).transpose()?,
        })
    }

    /// Merges the present fields into `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.product_name {
            product.product_name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
    }
}

fn parse_name(value: &str) -> CatalogResult<NonEmptyText> {
    NonEmptyText::new(value)
        .map_err(|_| CatalogError::InvalidInput("productName cannot be empty".into()))
}

fn parse_price(value: &str) -> CatalogResult<f64> {
    let price = value
        .trim()
        .parse::<f64>()
        .map_err(|_| CatalogError::InvalidInput(format!("price must be a number, got '{value}'")))?;

    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::InvalidInput(format!(
            "price must be a non-negative number, got '{value}'"
        )));
    }
    Ok(price)
}

fn parse_quantity(value: &str) -> CatalogResult<i64> {
    let quantity = value.trim().parse::<i64>().map_err(|_| {
        CatalogError::InvalidInput(format!("quantity must be an integer, got '{value}'"))
    })?;

    if quantity < 0 {
        return Err(CatalogError::InvalidInput(format!(
            "quantity cannot be negative, got '{value}'"
        )));
    }
    Ok(quantity)
}
