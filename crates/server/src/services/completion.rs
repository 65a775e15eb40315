//! Completion orchestration.
//!
//! A verified click is acknowledged by the route handler before any of the
//! work below starts. [`CompletionOrchestrator::spawn`] then runs the click
//! to a terminal [`CompletionOutcome`] on a detached task:
//!
//! 1. Decode the interaction payload
//! 2. Fetch the document
//! 3. Locate the item in the fresh snapshot
//! 4. Highlight it and insert the completion marker (one atomic batch)
//! 5. Replace the Slack message with the completed text
//!
//! Steps run strictly in order and every failure is terminal: it is logged
//! with its stage and identifiers, and nothing is retried. Nobody awaits the
//! detached task, so the outcome is only ever logged (or handed to an
//! optional observer). Detached runs are tracked so shutdown can wait for
//! them with [`CompletionOrchestrator::drain`].

use std::sync::Arc;
use std::time::Duration;

use checkmark_core::{
    CompletionOutcome, CompletionRequest, EditBatch, ItemLocator, Stage, completed_text,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};
use uuid::Uuid;

use super::{DocumentService, Notifier};
use crate::docs::DocsError;
use crate::slack::{
    DecodeError, SlackError, VerifiedRequest, build_completed_message, build_failure_notice,
    decode,
};

/// Why a completion run stopped.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("could not decode interaction: {0}")]
    Decode(#[from] DecodeError),

    #[error("could not fetch document: {0}")]
    Fetch(#[source] DocsError),

    #[error("item {locator} does not name a text item in the current document")]
    RangeNotFound { locator: ItemLocator },

    #[error("could not update document: {0}")]
    Update(#[source] DocsError),

    #[error("could not post confirmation: {0}")]
    Notify(#[source] SlackError),
}

impl CompletionError {
    /// Stage the run was in when it failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Decode(_) => Stage::Decoding,
            Self::Fetch(_) => Stage::FetchingDocument,
            Self::RangeNotFound { .. } => Stage::LocatingRange,
            Self::Update(_) => Stage::Updating,
            Self::Notify(_) => Stage::Notifying,
        }
    }

    /// Terminal outcome recorded for this failure.
    #[must_use]
    pub const fn outcome(&self) -> CompletionOutcome {
        match self {
            Self::Decode(_) => CompletionOutcome::DecodeFailed,
            Self::RangeNotFound { .. } => CompletionOutcome::RangeNotFound,
            Self::Fetch(_) | Self::Update(_) => CompletionOutcome::UpdateFailed,
            Self::Notify(_) => CompletionOutcome::NotifyFailed,
        }
    }

    /// Whether the user may be told about this failure.
    ///
    /// Decode failures have no trustworthy callback URL, and a notify failure
    /// means the callback URL is not accepting messages.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::RangeNotFound { .. } | Self::Update(_)
        )
    }
}

/// Drives verified clicks to completion.
pub struct CompletionOrchestrator {
    documents: Arc<dyn DocumentService>,
    notifier: Arc<dyn Notifier>,
    notify_failures: bool,
    observer: Option<mpsc::UnboundedSender<CompletionOutcome>>,
    runs: TaskTracker,
}

impl std::fmt::Debug for CompletionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOrchestrator")
            .field("notify_failures", &self.notify_failures)
            .field("observed", &self.observer.is_some())
            .field("in_flight", &self.runs.len())
            .finish_non_exhaustive()
    }
}

impl CompletionOrchestrator {
    /// Create an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            documents,
            notifier,
            notify_failures: false,
            observer: None,
            runs: TaskTracker::new(),
        }
    }

    /// Post an ephemeral notice when an item could not be completed.
    #[must_use]
    pub const fn with_failure_notices(mut self, enabled: bool) -> Self {
        self.notify_failures = enabled;
        self
    }

    /// Send every terminal outcome to `observer`.
    #[must_use]
    pub fn with_outcome_observer(
        mut self,
        observer: mpsc::UnboundedSender<CompletionOutcome>,
    ) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run `request` on a detached task.
    ///
    /// Returns immediately. The handle may be dropped; the task keeps running.
    pub fn spawn(self: &Arc<Self>, request: VerifiedRequest) -> JoinHandle<CompletionOutcome> {
        let span = info_span!(
            "completion",
            run_id = %Uuid::new_v4(),
            document_id = field::Empty,
            item_locator = field::Empty,
        );
        let orchestrator = Arc::clone(self);

        self.runs
            .spawn(async move { orchestrator.run(&request).await }.instrument(span))
    }

    /// Number of detached runs still in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.runs.len()
    }

    /// Wait up to `grace` for the detached runs to finish.
    ///
    /// Returns `true` if every run finished. Runs still in flight when
    /// `grace` expires are logged and abandoned.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.runs.close();
        let in_flight = self.runs.len();
        if in_flight == 0 {
            return true;
        }

        info!(in_flight, grace_secs = grace.as_secs(), "Waiting for completion runs");
        if tokio::time::timeout(grace, self.runs.wait()).await.is_ok() {
            info!("All completion runs finished");
            true
        } else {
            error!(
                abandoned = self.runs.len(),
                "Completion runs abandoned at shutdown"
            );
            false
        }
    }

    /// Run `request` to its terminal outcome, logging the result.
    pub async fn run(&self, request: &VerifiedRequest) -> CompletionOutcome {
        let outcome = match decode(request.body()) {
            Ok(completion) => {
                let span = Span::current();
                span.record("document_id", completion.document_id.as_str());
                span.record("item_locator", completion.item_locator.index());

                match self.complete(&completion).await {
                    Ok(text) => {
                        info!(text = %text, "Item marked complete");
                        CompletionOutcome::Completed
                    }
                    Err(err) => {
                        self.report_failure(&completion, &err).await;
                        err.outcome()
                    }
                }
            }
            Err(err) => {
                let err = CompletionError::from(err);
                warn!(stage = %err.stage(), error = %err, "Completion aborted");
                err.outcome()
            }
        };

        debug!(outcome = %outcome, "Completion run finished");
        if let Some(observer) = &self.observer {
            // The receiver going away only means nobody is watching any more
            let _ = observer.send(outcome);
        }

        outcome
    }

    /// Fetch, locate, update and notify for one decoded request.
    ///
    /// Returns the item's completed text.
    ///
    /// # Errors
    ///
    /// Returns the first step that failed. A locator that does not resolve
    /// against the fresh snapshot stops the run before any update is sent.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let snapshot = self
            .documents
            .fetch(&request.document_id)
            .await
            .map_err(CompletionError::Fetch)?;

        let range =
            snapshot
                .locate(request.item_locator)
                .ok_or(CompletionError::RangeNotFound {
                    locator: request.item_locator,
                })?;
        debug!(
            start = range.start(),
            end = range.end(),
            revision_id = ?snapshot.revision_id,
            "Located item"
        );

        let batch = EditBatch::mark_complete(&range, snapshot.revision_id);
        self.documents
            .update(&request.document_id, &batch)
            .await
            .map_err(CompletionError::Update)?;

        let text = completed_text(&range);
        self.notifier
            .post(&request.callback_url, &build_completed_message(&text))
            .await
            .map_err(CompletionError::Notify)?;

        Ok(text)
    }

    async fn report_failure(&self, request: &CompletionRequest, err: &CompletionError) {
        let stage = err.stage();
        match err {
            CompletionError::RangeNotFound { .. } => {
                warn!(stage = %stage, error = %err, "Completion aborted");
            }
            CompletionError::Notify(_) => {
                warn!(stage = %stage, error = %err, "Document updated but confirmation failed");
            }
            _ => error!(stage = %stage, error = %err, "Completion failed"),
        }

        if !(self.notify_failures && err.is_reportable()) {
            return;
        }

        if let Err(e) = self
            .notifier
            .post(&request.callback_url, &build_failure_notice(stage))
            .await
        {
            warn!(error = %e, "Failed to post failure notice");
        }
    }
}
