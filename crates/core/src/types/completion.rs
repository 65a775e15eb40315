//! Completion requests and run outcomes.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::id::{DocumentId, ItemLocator};

/// A decoded request to mark one document item as complete.
///
/// All three fields are required; a request missing any of them is never
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Document holding the item.
    pub document_id: DocumentId,
    /// Which item of the document to complete.
    pub item_locator: ItemLocator,
    /// Where to post the confirmation.
    pub callback_url: Url,
}

/// Stage of a completion run, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decoding,
    FetchingDocument,
    LocatingRange,
    Updating,
    Notifying,
}

impl Stage {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Decoding => "decoding",
            Self::FetchingDocument => "fetching_document",
            Self::LocatingRange => "locating_range",
            Self::Updating => "updating",
            Self::Notifying => "notifying",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of handling one interaction.
///
/// Only ever logged: the caller was acknowledged before the run started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// Verified, document updated and confirmation posted.
    Completed,
    /// Signature or timestamp check failed; nothing else happened.
    VerificationFailed,
    /// The interaction payload could not be decoded.
    DecodeFailed,
    /// The locator does not name a text item in the current document.
    RangeNotFound,
    /// Fetching or updating the document failed.
    UpdateFailed,
    /// The document was updated but the confirmation could not be posted.
    NotifyFailed,
}

impl CompletionOutcome {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::VerificationFailed => "verification_failed",
            Self::DecodeFailed => "decode_failed",
            Self::RangeNotFound => "range_not_found",
            Self::UpdateFailed => "update_failed",
            Self::NotifyFailed => "notify_failed",
        }
    }

    /// Whether the document was changed during the run.
    #[must_use]
    pub const fn document_updated(&self) -> bool {
        matches!(self, Self::Completed | Self::NotifyFailed)
    }
}

impl fmt::Display for CompletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_names() {
        assert_eq!(CompletionOutcome::Completed.to_string(), "completed");
        assert_eq!(
            CompletionOutcome::RangeNotFound.to_string(),
            "range_not_found"
        );
        assert_eq!(
            serde_json::to_string(&CompletionOutcome::NotifyFailed).ok(),
            Some("\"notify_failed\"".to_string())
        );
    }

    #[test]
    fn test_document_updated() {
        assert!(CompletionOutcome::Completed.document_updated());
        assert!(CompletionOutcome::NotifyFailed.document_updated());
        assert!(!CompletionOutcome::UpdateFailed.document_updated());
        assert!(!CompletionOutcome::RangeNotFound.document_updated());
        assert!(!CompletionOutcome::VerificationFailed.document_updated());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::FetchingDocument.to_string(), "fetching_document");
        assert_eq!(Stage::Notifying.as_str(), "notifying");
    }
}
