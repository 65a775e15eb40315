//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::docs::{DocsClient, DocsError};
use crate::services::{CompletionOrchestrator, DeliveryGuard};
use crate::slack::{SignatureVerifier, SlackClient, SlackError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("docs client: {0}")]
    Docs(#[from] DocsError),
    #[error("slack client: {0}")]
    Slack(#[from] SlackError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds only values built once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    verifier: SignatureVerifier,
    orchestrator: Arc<CompletionOrchestrator>,
    delivery_guard: Option<DeliveryGuard>,
}

impl AppState {
    /// Build the state from configuration, creating the Google Docs and
    /// Slack clients.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn new(config: &AppConfig) -> Result<Self, StateError> {
        let documents = DocsClient::new(
            config.google.credentials.clone(),
            config.google.api_base.clone(),
            config.google.token_uri.clone(),
            config.http_timeout,
        )?;
        let notifier = SlackClient::new(config.http_timeout)?;

        let orchestrator = CompletionOrchestrator::new(Arc::new(documents), Arc::new(notifier))
            .with_failure_notices(config.completion.notify_failures);

        Ok(Self::from_parts(
            SignatureVerifier::new(config.slack.signing_secret.clone()),
            orchestrator,
            config.completion.dedup.then(DeliveryGuard::for_replay_window),
        ))
    }

    /// Assemble the state from already-built parts.
    #[must_use]
    pub fn from_parts(
        verifier: SignatureVerifier,
        orchestrator: CompletionOrchestrator,
        delivery_guard: Option<DeliveryGuard>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                verifier,
                orchestrator: Arc::new(orchestrator),
                delivery_guard,
            }),
        }
    }

    /// Get the Slack signature verifier.
    #[must_use]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.inner.verifier
    }

    /// Get the completion orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<CompletionOrchestrator> {
        &self.inner.orchestrator
    }

    /// Get the duplicate-delivery guard, if enabled.
    #[must_use]
    pub fn delivery_guard(&self) -> Option<&DeliveryGuard> {
        self.inner.delivery_guard.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.inner.verifier)
            .field("orchestrator", &self.inner.orchestrator)
            .field("delivery_guard", &self.inner.delivery_guard)
            .finish()
    }
}
