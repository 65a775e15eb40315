//! Completion services.
//!
//! # Services
//!
//! - `completion` - Ack-fast orchestration of one button click
//! - `dedup` - Short-lived guard against duplicate webhook deliveries
//!
//! The orchestrator talks to the outside world only through the
//! [`DocumentService`] and [`Notifier`] traits, implemented by
//! [`DocsClient`](crate::docs::DocsClient) and
//! [`SlackClient`](crate::slack::SlackClient).

pub mod completion;
pub mod dedup;

pub use completion::{CompletionError, CompletionOrchestrator};
pub use dedup::DeliveryGuard;

use async_trait::async_trait;
use checkmark_core::{DocumentId, DocumentSnapshot, EditBatch};
use url::Url;

use crate::docs::DocsError;
use crate::slack::{ResponseMessage, SlackError};

/// Reads and atomically edits remote documents.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch the current content of a document.
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentSnapshot, DocsError>;

    /// Apply every operation of `batch`, or none of them.
    async fn update(&self, document_id: &DocumentId, batch: &EditBatch) -> Result<(), DocsError>;
}

/// Posts messages to a caller-supplied callback URL.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post `message` to `callback_url`.
    async fn post(&self, callback_url: &Url, message: &ResponseMessage) -> Result<(), SlackError>;
}
