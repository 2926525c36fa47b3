//! Shared value types for the product catalog.
//!
//! - [`NonEmptyText`]: trimmed text with at least one character (product names)
//! - [`ProductId`]: product identifier with sharded directory derivation

mod id;

pub use id::ProductId;

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("text cannot be empty")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid product id: {0}")]
    InvalidInput(String),
}

pub type IdResult<T> = Result<T, IdError>;

/// Text trimmed at construction and guaranteed non-empty.
///
/// `"  Desk Lamp "` and `"Desk Lamp"` are the same value, so name uniqueness ignores
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing is left after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            trimmed => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}
