//! Constants used throughout the catalog core crate.
//!
//! This module contains path, filename and limit constants so the store, config and binaries
//! agree on one layout.

/// Default directory for product records when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "catalog_data";

/// Default directory uploaded images are written to.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Directory name (under the data directory) holding sharded product records.
pub const PRODUCTS_DIR_NAME: &str = "products";

/// Directory name (under the data directory) holding the product name index.
pub const NAMES_DIR_NAME: &str = "names";

/// Filename for product JSON records.
pub const PRODUCT_JSON_FILENAME: &str = "product.json";

/// Default per-file upload cap (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Default number of files accepted by a multi-image upload.
pub const DEFAULT_MAX_FILES: usize = 4;
