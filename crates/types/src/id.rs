//! Product identifiers.
//!
//! A product id is rendered as 32 lowercase hex characters without hyphens (the "simple" form
//! of a v4 UUID). Records are sharded on the first two byte pairs of that form:
//!
//! ```text
//! <products_dir>/55/0e/550e8400e29b41d4a716446655440000/
//! ```

use crate::{IdError, IdResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Length of the rendered id.
const ID_LEN: usize = 32;

/// Identifier of a stored product.
///
/// Only the canonical rendering is accepted when parsing, so an id taken from a URL maps to
/// exactly one record directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct ProductId(Uuid);

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductId {
    /// Allocates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an id in canonical form. Hyphenated or uppercase spellings are rejected, not
    /// normalised.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] for anything but 32 lowercase hex characters.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "product id must be 32 lowercase hex characters, got '{input}'"
            )));
        }

        Uuid::try_parse(input)
            .map(Self)
            .map_err(|e| IdError::InvalidInput(e.to_string()))
    }

    pub fn is_canonical(input: &str) -> bool {
        input.len() == ID_LEN && input.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// `parent/<id[0..2]>/<id[2..4]>/<id>`
    pub fn sharded_dir(&self, parent: &Path) -> PathBuf {
        let id = self.to_string();
        parent.join(&id[..2]).join(&id[2..4]).join(&id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.simple(), f)
    }
}

impl FromStr for ProductId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.to_string()
    }
}
