//! Upload directory service implementation
//!
//! [`ImageFiles`] is bound to one upload directory and provides the three things the catalog
//! needs from the filesystem:
//!
//! - **Persisting** an uploaded image under a generated unique name
//! - **Removing** images whose paths were dropped from a product record
//! - **Listing** the directory, so operators can find files no record references
//!
//! # Removal Semantics
//!
//! Removal never fails the caller. Each path is checked for existence and removed with a single
//! attempt. A path that is already gone counts as removed. Any other I/O failure becomes a
//! [`RemovalWarning`], is logged at `warn`, and is returned so callers can surface it alongside
//! an otherwise successful update.

use crate::{FilesError, IMAGE_FILENAME_PREFIX};
use chrono::Utc;
use rand::Rng;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Maximum number of filename allocation attempts before giving up.
const MAX_NAME_ATTEMPTS: usize = 5;

/// An image file that has been written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredImage {
    /// Path of the stored file, as it will be referenced from product records
    pub path: String,

    /// Declared media type of the upload
    pub mimetype: String,
}

/// A file that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RemovalWarning {
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for RemovalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to remove {}: {}", self.path, self.reason)
    }
}

/// Service for the flat image upload directory
#[derive(Debug, Clone)]
pub struct ImageFiles {
    /// Directory uploaded images are written to
    upload_dir: PathBuf,

    /// Per-file size cap in bytes
    max_file_size: u64,
}

impl ImageFiles {
    /// Creates a new `ImageFiles` bound to `upload_dir`.
    ///
    /// The directory is not canonicalised: stored paths keep the prefix the service was
    /// configured with (e.g. `uploads/IMG_…png`).
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidUploadDirectory` if the directory does not exist or is not a
    /// directory.
    pub fn new(upload_dir: &Path, max_file_size: u64) -> Result<Self, FilesError> {
        if !upload_dir.exists() {
            return Err(FilesError::InvalidUploadDirectory(format!(
                "Directory does not exist: {}",
                upload_dir.display()
            )));
        }

        if !upload_dir.is_dir() {
            return Err(FilesError::InvalidUploadDirectory(format!(
                "Path is not a directory: {}",
                upload_dir.display()
            )));
        }

        Ok(Self {
            upload_dir: upload_dir.to_path_buf(),
            max_file_size,
        })
    }

    /// Returns the upload directory.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Rejects media types that are not `image/*`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::UnsupportedMediaType` for anything else.
    pub fn check_mimetype(mimetype: &str) -> Result<(), FilesError> {
        if mimetype.starts_with("image/") {
            Ok(())
        } else {
            Err(FilesError::UnsupportedMediaType(mimetype.to_string()))
        }
    }

    /// Rejects uploads larger than the configured cap.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::FileTooLarge` if `size` exceeds the cap.
    pub fn check_size(&self, size: u64) -> Result<(), FilesError> {
        if size > self.max_file_size {
            return Err(FilesError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Writes an uploaded image into the upload directory under a generated name.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the media type is not an image
    /// - the content exceeds the size cap
    /// - no unused filename could be allocated, or the write fails (I/O)
    pub fn persist(&self, mimetype: &str, bytes: &[u8]) -> Result<StoredImage, FilesError> {
        Self::check_mimetype(mimetype)?;
        self.check_size(bytes.len() as u64)?;

        for _attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = self.upload_dir.join(generate_filename(mimetype));

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(FilesError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create {}: {}", candidate.display(), e),
                    )))
                }
            };

            if let Err(e) = file.write_all(bytes) {
                drop(file);
                let _ = fs::remove_file(&candidate);
                return Err(FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write {}: {}", candidate.display(), e),
                )));
            }

            let path = candidate.to_string_lossy().into_owned();
            tracing::debug!(%path, %mimetype, size = bytes.len(), "stored image");

            return Ok(StoredImage {
                path,
                mimetype: mimetype.to_string(),
            });
        }

        Err(FilesError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "failed to allocate a unique image filename after {} attempts",
                MAX_NAME_ATTEMPTS
            ),
        )))
    }

    /// Removes every path, collecting failures as warnings.
    ///
    /// Paths that no longer exist are treated as removed.
    pub fn remove_all<S: AsRef<str>>(&self, paths: &[S]) -> Vec<RemovalWarning> {
        let mut warnings = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match remove_if_exists(Path::new(path)) {
                Ok(true) => tracing::debug!(%path, "removed image"),
                Ok(false) => tracing::debug!(%path, "image already absent"),
                Err(e) => {
                    tracing::warn!(%path, error = %e, "failed to remove image");
                    warnings.push(RemovalWarning {
                        path: path.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        warnings
    }

    /// Removes images written for a request that was subsequently rejected.
    pub fn discard(&self, images: &[StoredImage]) -> Vec<RemovalWarning> {
        let paths: Vec<&str> = images.iter().map(|image| image.path.as_str()).collect();
        self.remove_all(&paths)
    }

    /// Lists the regular files that carry the generated image prefix.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>, FilesError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.upload_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let is_image = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(IMAGE_FILENAME_PREFIX));
            if is_image {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Removes `path` if it exists.
///
/// Returns `Ok(true)` if a file was removed and `Ok(false)` if it was already absent.
///
/// # Errors
///
/// Returns the underlying `std::io::Error` for any failure other than absence.
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Builds `IMG_<unix millis><0-99 random>.<subtype>` for the given media type.
fn generate_filename(mimetype: &str) -> String {
    let subtype = mimetype
        .split('/')
        .nth(1)
        .and_then(|rest| rest.split(';').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("bin");
    let random: u8 = rand::thread_rng().gen_range(0..100);

    format!(
        "{}{}{}.{}",
        IMAGE_FILENAME_PREFIX,
        Utc::now().timestamp_millis(),
        random,
        subtype
    )
}
