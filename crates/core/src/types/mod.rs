//! Core types for Checkmark.
//!
//! This module provides type-safe wrappers for the completion workflow.

pub mod completion;
pub mod document;
pub mod edit;
pub mod id;

pub use completion::{CompletionOutcome, CompletionRequest, Stage};
pub use document::{ContentUnit, DocumentRange, DocumentSnapshot, RangeError, TextRun, utf16_len};
pub use edit::{
    COMPLETED_HIGHLIGHT, COMPLETION_MARKER, EditBatch, EditOperation, RgbColor, completed_text,
};
pub use id::{DocumentId, DocumentIdError, ItemLocator};
