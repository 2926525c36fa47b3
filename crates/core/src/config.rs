//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Request handling never reads process-wide environment variables, which keeps behaviour
//! consistent across threads and test harnesses.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_SIZE, DEFAULT_UPLOAD_DIR,
    NAMES_DIR_NAME, PRODUCTS_DIR_NAME,
};
use crate::{CatalogError, CatalogResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    upload_dir: PathBuf,
    max_file_size: u64,
    max_files: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`, creating the data and upload directories if missing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if:
    /// - `max_file_size` or `max_files` is zero ([`CatalogError::InvalidInput`])
    /// - either directory cannot be created ([`CatalogError::StorageDirCreation`])
    pub fn new(
        data_dir: PathBuf,
        upload_dir: PathBuf,
        max_file_size: u64,
        max_files: usize,
    ) -> CatalogResult<Self> {
        if max_file_size == 0 {
            return Err(CatalogError::InvalidInput(
                "max_file_size must be greater than zero".into(),
            ));
        }
        if max_files == 0 {
            return Err(CatalogError::InvalidInput(
                "max_files must be greater than zero".into(),
            ));
        }

        for dir in [&data_dir, &upload_dir] {
            std::fs::create_dir_all(dir).map_err(CatalogError::StorageDirCreation)?;
        }

        Ok(Self {
            data_dir,
            upload_dir,
            max_file_size,
            max_files,
        })
    }

    /// Create a `CoreConfig` with the default upload limits.
    pub fn with_defaults(data_dir: PathBuf, upload_dir: PathBuf) -> CatalogResult<Self> {
        Self::new(data_dir, upload_dir, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }

    /// Resolve configuration from raw environment values.
    ///
    /// Missing or blank values fall back to the defaults. Binaries read the variables once
    /// (`CATALOG_DATA_DIR`, `CATALOG_UPLOAD_DIR`, `CATALOG_MAX_FILE_SIZE`,
    /// `CATALOG_MAX_FILES`) and pass them in here.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidInput`] for a malformed limit, or any error of
    /// [`CoreConfig::new`].
    pub fn from_env_values(
        data_dir: Option<String>,
        upload_dir: Option<String>,
        max_file_size: Option<String>,
        max_files: Option<String>,
    ) -> CatalogResult<Self> {
        let dir_or = |value: Option<String>, default: &str| {
            PathBuf::from(
                value
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| default.to_string()),
            )
        };

        Self::new(
            dir_or(data_dir, DEFAULT_DATA_DIR),
            dir_or(upload_dir, DEFAULT_UPLOAD_DIR),
            parse_limit_value("CATALOG_MAX_FILE_SIZE", max_file_size, DEFAULT_MAX_FILE_SIZE)?,
            parse_limit_value("CATALOG_MAX_FILES", max_files, DEFAULT_MAX_FILES)?,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn products_dir(&self) -> PathBuf {
        self.data_dir.join(PRODUCTS_DIR_NAME)
    }

    pub fn names_dir(&self) -> PathBuf {
        self.data_dir.join(NAMES_DIR_NAME)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }
}

/// Parse an optional numeric setting, falling back to `default` when unset or blank.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidInput`] naming `key` if the value is not a valid number.
pub fn parse_limit_value<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> CatalogResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| CatalogError::InvalidInput(format!("{key} must be a number, got '{v}'"))),
        None => Ok(default),
    }
}
