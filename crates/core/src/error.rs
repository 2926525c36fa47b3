#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("product not found: {0}")]
    NotFound(String),
    #[error("{0} already exist")]
    Conflict(String),
    #[error("invalid image index {index} (product has {len} images)")]
    InvalidIndex { index: i64, len: usize },
    #[error("indexes count ({indexes}) must match uploaded files count ({files})")]
    CountMismatch { indexes: usize, files: usize },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create product directory: {0}")]
    ProductDirCreation(std::io::Error),
    #[error("failed to write product file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read product file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove product record: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to update name index: {0}")]
    NameIndex(std::io::Error),
    #[error("failed to serialize product: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize product: {0}")]
    Deserialization(serde_json::Error),

    #[error("file storage error: {0}")]
    Files(#[from] catalog_files::FilesError),
    #[error("invalid identifier: {0}")]
    Id(#[from] catalog_types::IdError),
    #[error("invalid text: {0}")]
    Text(#[from] catalog_types::TextError),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
