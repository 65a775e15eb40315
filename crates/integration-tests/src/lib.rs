//! Integration tests for Checkmark.
//!
//! Drives the real router end to end with in-memory stand-ins for Google
//! Docs and Slack, so every test runs offline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p checkmark-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `completion_flow` - Click scenarios and failure stages
//! - `ack_timing` - Acknowledgement before the detached run finishes
//! - `concurrency` - Interleaved and duplicate deliveries
//! - `slash_command` - `/addtask` through to a completed item

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use checkmark_core::{
    CompletionOutcome, ContentUnit, DocumentId, DocumentSnapshot, EditBatch, TextRun, utf16_len,
};
use checkmark_server::docs::DocsError;
use checkmark_server::services::{
    CompletionOrchestrator, DeliveryGuard, DocumentService, Notifier,
};
use checkmark_server::slack::{
    ResponseMessage, SIGNATURE_HEADER, SignatureVerifier, SlackError, TIMESTAMP_HEADER,
    compute_signature,
};
use checkmark_server::{AppState, build_router};
use secrecy::SecretString;
use tokio::sync::{Semaphore, mpsc};
use url::Url;

/// Signing secret shared by the test app and the request builders.
pub const SIGNING_SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

/// Callback URL used by the click builders.
pub const RESPONSE_URL: &str = "https://hooks.slack.com/actions/T1/1/abc";

// =============================================================================
// Fakes
// =============================================================================

/// In-memory document service.
#[derive(Default)]
pub struct FakeDocuments {
    snapshot: Mutex<Option<DocumentSnapshot>>,
    gate: Option<Arc<Semaphore>>,
    fail_update: bool,
    fetches: Mutex<Vec<String>>,
    updates: Mutex<Vec<(String, EditBatch)>>,
}

impl FakeDocuments {
    /// Serve `snapshot` for every document id.
    #[must_use]
    pub fn serving(snapshot: DocumentSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Hold every fetch until a permit is added to `gate`.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Reject every update.
    #[must_use]
    pub fn failing_updates(mut self) -> Self {
        self.fail_update = true;
        self
    }

    /// Document ids fetched so far.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    /// Updates applied so far.
    pub fn updates(&self) -> Vec<(String, EditBatch)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentService for FakeDocuments {
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentSnapshot, DocsError> {
        self.fetches.lock().unwrap().push(document_id.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DocsError::NotFound(document_id.to_string()))
    }

    async fn update(&self, document_id: &DocumentId, batch: &EditBatch) -> Result<(), DocsError> {
        if self.fail_update {
            return Err(DocsError::Api {
                status: 500,
                message: "backend error".to_string(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((document_id.to_string(), batch.clone()));
        Ok(())
    }
}

/// Notifier that records every message.
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingNotifier {
    /// A notifier whose every post fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Posts made so far as `(url, message JSON)`.
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post(&self, callback_url: &Url, message: &ResponseMessage) -> Result<(), SlackError> {
        self.posts.lock().unwrap().push((
            callback_url.to_string(),
            serde_json::to_value(message).unwrap(),
        ));
        if self.fail {
            return Err(SlackError::Response {
                status: 410,
                body: "expired_url".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Test app
// =============================================================================

/// The router wired to fakes, plus a feed of run outcomes.
pub struct TestApp {
    pub router: Router,
    pub documents: Arc<FakeDocuments>,
    pub notifier: Arc<RecordingNotifier>,
    pub outcomes: mpsc::UnboundedReceiver<CompletionOutcome>,
}

impl TestApp {
    /// Build an app with the duplicate-delivery guard enabled.
    #[must_use]
    pub fn new(documents: FakeDocuments, notifier: RecordingNotifier) -> Self {
        Self::with_options(documents, notifier, true, false)
    }

    /// Build an app with explicit completion switches.
    #[must_use]
    pub fn with_options(
        documents: FakeDocuments,
        notifier: RecordingNotifier,
        dedup: bool,
        notify_failures: bool,
    ) -> Self {
        let documents = Arc::new(documents);
        let notifier = Arc::new(notifier);
        let (tx, outcomes) = mpsc::unbounded_channel();

        let orchestrator = CompletionOrchestrator::new(
            Arc::clone(&documents) as Arc<dyn DocumentService>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        )
        .with_failure_notices(notify_failures)
        .with_outcome_observer(tx);

        let state = AppState::from_parts(
            SignatureVerifier::new(SecretString::from(SIGNING_SECRET)),
            orchestrator,
            dedup.then(DeliveryGuard::for_replay_window),
        );

        Self {
            router: build_router(state),
            documents,
            notifier,
            outcomes,
        }
    }

    /// Wait for the next run to finish.
    pub async fn next_outcome(&mut self) -> CompletionOutcome {
        self.outcomes.recv().await.unwrap()
    }

    /// Whether no run has finished since the last check.
    pub fn no_outcome_pending(&mut self) -> bool {
        self.outcomes.try_recv().is_err()
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A document whose unit 0 is a section break and unit `i + 1` is
/// paragraph `items[i]`.
#[must_use]
pub fn document(items: &[&str]) -> DocumentSnapshot {
    let mut content = vec![ContentUnit {
        start_index: 0,
        end_index: 1,
        text_runs: vec![],
    }];

    let mut offset = 1;
    for item in items {
        let text = format!("{item}\n");
        let end = offset + utf16_len(&text);
        content.push(ContentUnit {
            start_index: offset,
            end_index: end,
            text_runs: vec![TextRun {
                start_index: offset,
                content: text,
            }],
        });
        offset = end;
    }

    DocumentSnapshot {
        revision_id: Some("rev-1".to_string()),
        content,
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Form body of a button click carrying `action_value`.
#[must_use]
pub fn click_body_with_value(action_value: &str, response_url: Option<&str>) -> String {
    let mut payload = serde_json::json!({
        "type": "block_actions",
        "user": { "id": "U123", "username": "ada" },
        "actions": [{ "action_id": "mark_done", "value": action_value }],
    });
    if let Some(url) = response_url {
        payload["response_url"] = serde_json::Value::from(url);
    }
    form_body(&[("payload", &payload.to_string())])
}

/// Form body of a button click on `item_locator` of `document_id`.
#[must_use]
pub fn click_body(document_id: &str, item_locator: u32) -> String {
    let value = serde_json::json!({
        "documentId": document_id,
        "itemLocator": item_locator,
    })
    .to_string();
    click_body_with_value(&value, Some(RESPONSE_URL))
}

/// Form body of a click whose payload has `payload_json` verbatim.
#[must_use]
pub fn raw_payload_body(payload_json: &serde_json::Value) -> String {
    form_body(&[("payload", &payload_json.to_string())])
}

/// URL-encode form pairs.
#[must_use]
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// A POST signed with [`SIGNING_SECRET`] at the current time.
#[must_use]
pub fn signed_post(uri: &str, body: &str) -> Request<Body> {
    signed_post_at(uri, body, chrono::Utc::now().timestamp(), SIGNING_SECRET)
}

/// A POST signed with `secret` at `timestamp`.
#[must_use]
pub fn signed_post_at(uri: &str, body: &str, timestamp: i64, secret: &str) -> Request<Body> {
    let timestamp = timestamp.to_string();
    let signature = compute_signature(secret, &timestamp, body.as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}
