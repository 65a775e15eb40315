//! Document snapshots and located ranges.
//!
//! A [`DocumentSnapshot`] is the service-agnostic view of a fetched document:
//! its revision and the top-level content units in order. Offsets are
//! counted in UTF-16 code units, which is how Google Docs addresses text.

use serde::{Deserialize, Serialize};

use super::id::ItemLocator;

/// A run of text inside a content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// Offset of the first character of the run.
    pub start_index: usize,
    /// Text of the run, including any trailing newline.
    pub content: String,
}

/// A top-level structural element of a document.
///
/// Paragraphs carry their text runs; other elements (section breaks, tables,
/// tables of contents) have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Offset where the unit starts.
    pub start_index: usize,
    /// Offset one past the unit's last character.
    pub end_index: usize,
    /// Text runs, in order. Empty for non-paragraph elements.
    pub text_runs: Vec<TextRun>,
}

/// A fetched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Revision the snapshot was read at, if the service reported one.
    pub revision_id: Option<String>,
    /// Top-level content, in document order.
    pub content: Vec<ContentUnit>,
}

/// Errors that can occur when constructing a [`DocumentRange`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// `start` lies after `end`.
    #[error("range start {start} is after end {end}")]
    Inverted {
        /// Requested start.
        start: usize,
        /// Requested end.
        end: usize,
    },
}

/// A contiguous span `[start, end)` of a document and the text it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRange {
    start: usize,
    end: usize,
    text: String,
}

impl DocumentRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::Inverted` if `start > end`.
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self {
            start,
            end,
            text: text.into(),
        })
    }

    /// Inclusive start offset.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Text currently occupying the range.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the range in offset units.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no characters.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of UTF-16 code units in `s`.
#[must_use]
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

impl DocumentSnapshot {
    /// Resolve a locator to the text range of the item it names.
    ///
    /// The locator indexes the top-level content list. The item's text is
    /// every run of the unit joined, without the trailing newline. Returns
    /// `None` when the index is out of bounds, the unit holds no text, or the
    /// runs are not contiguous inside their unit (an inconsistent snapshot is
    /// never edited).
    #[must_use]
    pub fn locate(&self, locator: ItemLocator) -> Option<DocumentRange> {
        let unit = self.content.get(locator.index())?;
        let start = unit.text_runs.first()?.start_index;

        let mut joined = String::new();
        let mut next = start;
        for run in &unit.text_runs {
            if run.start_index != next {
                return None;
            }
            next = next.checked_add(utf16_len(&run.content))?;
            joined.push_str(&run.content);
        }

        let text = joined.trim_end_matches(['\n', '\r']);
        if text.trim().is_empty() {
            return None;
        }

        let end = start.checked_add(utf16_len(text))?;
        if start < unit.start_index || end > unit.end_index {
            return None;
        }

        DocumentRange::new(start, end, text).ok()
    }
}
