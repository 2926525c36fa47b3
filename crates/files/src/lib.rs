//! Product image file storage
//!
//! This crate owns the flat upload directory in which product images live. A product record
//! only ever references an image through the path string returned here.
//!
//! ## Storage Model
//!
//! ```text
//! uploads/
//! ├── IMG_1718035200123042.png
//! ├── IMG_1718035200456007.jpeg
//! └── …
//! ```
//!
//! - Accepted uploads must declare an `image/*` media type and fit the configured size cap
//! - Filenames are generated as `IMG_<unix millis><0-99 random>.<mime subtype>`
//! - Removal is best-effort: a missing file is not an error, other failures are reported as
//!   [`RemovalWarning`]s instead of aborting the caller
//!
//! ## Example Usage
//!
//! ```no_run
//! use catalog_files::ImageFiles;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = ImageFiles::new(Path::new("uploads"), 1024 * 1024)?;
//! let stored = files.persist("image/png", b"\x89PNG\r\n\x1a\n")?;
//! let warnings = files.remove_all(&[stored.path]);
//! assert!(warnings.is_empty());
//! # Ok(())
//! # }
//! ```

mod files;

pub use files::{remove_if_exists, ImageFiles, RemovalWarning, StoredImage};

/// Prefix of every generated image filename.
pub const IMAGE_FILENAME_PREFIX: &str = "IMG_";

/// Errors that can occur during image file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Upload directory does not exist or is not a directory
    #[error("Invalid upload directory: {0}")]
    InvalidUploadDirectory(String),

    /// Declared media type is not an image
    #[error("Invalid file format, Only image files allowed")]
    UnsupportedMediaType(String),

    /// Upload exceeds the per-file size cap
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// More files were supplied than the route accepts
    #[error("Too many files: at most {0} allowed")]
    TooManyFiles(usize),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
