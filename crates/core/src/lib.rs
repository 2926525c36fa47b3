//! # Catalog Core
//!
//! Core business logic for the product catalog.
//!
//! This crate contains pure data operations and file/folder management:
//! - Product records in a sharded JSON store under the data directory
//! - Image list bookkeeping (append, replace, replace by position, delete by position)
//! - Removal of image files that leave a product's list
//!
//! **No API concerns**: HTTP routing, multipart decoding and response envelopes belong in
//! `catalog-api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod images;
pub mod product;
pub mod service;
pub mod store;

pub use catalog_files::{FilesError, ImageFiles, RemovalWarning, StoredImage};
pub use catalog_types::{IdError, NonEmptyText, ProductId, TextError};
pub use config::CoreConfig;
pub use constants::{DEFAULT_DATA_DIR, DEFAULT_UPLOAD_DIR};
pub use error::{CatalogError, CatalogResult};
pub use images::{ImageChange, Replacement, ReplacementStatus};
pub use product::{NewProduct, Product, ProductFields, ProductUpdate};
pub use service::{BatchReplace, Mutation, OrphanPrune, ProductService};
pub use store::{JsonProductStore, ProductStore};
