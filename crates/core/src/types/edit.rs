//! Edit batches applied to a remote document.
//!
//! An [`EditBatch`] is submitted as one atomic request: either every
//! operation applies or none does.

use serde::{Deserialize, Serialize};

use super::document::DocumentRange;

/// Marker prepended to an item when it is completed.
pub const COMPLETION_MARKER: &str = "✅ ";

/// Background colour applied to completed items (pale green).
pub const COMPLETED_HIGHLIGHT: RgbColor = RgbColor {
    red: 0.83,
    green: 0.93,
    blue: 0.85,
};

/// An RGB colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// A single operation inside an [`EditBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOperation {
    /// Set the background colour of `[start, end)`.
    StyleRange {
        start: usize,
        end: usize,
        background: RgbColor,
    },
    /// Insert `text` before the character at `index`.
    InsertText { index: usize, text: String },
}

/// Operations applied atomically to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditBatch {
    /// Operations, applied in order.
    pub operations: Vec<EditOperation>,
    /// Reject the batch if the document is no longer at this revision.
    pub required_revision_id: Option<String>,
}

impl EditBatch {
    /// Build the batch that marks `range` as complete.
    ///
    /// Highlights the range, then inserts [`COMPLETION_MARKER`] at its start.
    /// The style is applied first so its offsets are not shifted by the
    /// insertion.
    #[must_use]
    pub fn mark_complete(range: &DocumentRange, required_revision_id: Option<String>) -> Self {
        Self {
            operations: vec![
                EditOperation::StyleRange {
                    start: range.start(),
                    end: range.end(),
                    background: COMPLETED_HIGHLIGHT,
                },
                EditOperation::InsertText {
                    index: range.start(),
                    text: COMPLETION_MARKER.to_string(),
                },
            ],
            required_revision_id,
        }
    }
}

/// Text an item shows once it has been marked complete.
#[must_use]
pub fn completed_text(range: &DocumentRange) -> String {
    format!("{COMPLETION_MARKER}{}", range.text())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_complete_batch() {
        let range = DocumentRange::new(16, 24, "Buy milk").unwrap();
        let batch = EditBatch::mark_complete(&range, Some("rev-7".to_string()));

        assert_eq!(batch.required_revision_id.as_deref(), Some("rev-7"));
        assert_eq!(
            batch.operations,
            vec![
                EditOperation::StyleRange {
                    start: 16,
                    end: 24,
                    background: COMPLETED_HIGHLIGHT,
                },
                EditOperation::InsertText {
                    index: 16,
                    text: "✅ ".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_completed_text() {
        let range = DocumentRange::new(16, 24, "Buy milk").unwrap();
        assert_eq!(completed_text(&range), "✅ Buy milk");
    }
}
