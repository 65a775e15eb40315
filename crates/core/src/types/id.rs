//! Identifiers carried by a completion request.
//!
//! [`DocumentId`] is an opaque, non-empty string assigned by the remote
//! document service. [`ItemLocator`] is an index into a document's top-level
//! content list; it is *not* a character offset and has to be resolved
//! against a fetched snapshot before it can be edited.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DocumentId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentIdError {
    /// The input string is empty or whitespace.
    #[error("document id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("document id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters that cannot appear in a path segment.
    #[error("document id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Identifier of a remote document.
///
/// ## Constraints
///
/// - Length: 1-256 characters
/// - ASCII letters, digits, `-` and `_` only (it ends up in a URL path)
///
/// ## Examples
///
/// ```
/// use checkmark_core::DocumentId;
///
/// assert!(DocumentId::parse("1a2B-c_3").is_ok());
/// assert!(DocumentId::parse("").is_err());
/// assert!(DocumentId::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Maximum length of a document id.
    pub const MAX_LENGTH: usize = 256;

    /// Parse a `DocumentId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains a
    /// character outside `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, DocumentIdError> {
        if s.trim().is_empty() {
            return Err(DocumentIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(DocumentIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(DocumentIdError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DocumentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Index of a content unit in a document's top-level content list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemLocator(u32);

impl ItemLocator {
    /// Create a locator from an index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ItemLocator {
    fn from(index: u32) -> Self {
        Self(index)
    }
}
