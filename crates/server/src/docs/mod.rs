//! Google Docs API client.
//!
//! Reads document structure and applies atomic batch updates.
//!
//! # API Reference
//!
//! - Base URL: `https://docs.googleapis.com`
//! - Authentication: OAuth 2.0 bearer token (service account or pre-issued)
//! - Read: `GET /v1/documents/{documentId}`
//! - Write: `POST /v1/documents/{documentId}:batchUpdate`

mod auth;
mod conversions;
mod error;
pub mod types;

pub use auth::{
    DEFAULT_TOKEN_URI, DOCUMENTS_SCOPE, GoogleCredentials, GoogleToken, build_assertion,
    exchange_service_account_token,
};
pub use conversions::{convert_batch, convert_document};
pub use error::DocsError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkmark_core::{DocumentId, DocumentSnapshot, EditBatch};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::services::DocumentService;
use types::{BatchUpdateResponse, Document, ErrorResponse};

/// Google Docs API base URL.
pub const DEFAULT_API_BASE: &str = "https://docs.googleapis.com";

/// Fields requested when reading a document.
const DOCUMENT_FIELDS: &str = "documentId,revisionId,body.content(startIndex,endIndex,paragraph.elements(startIndex,endIndex,textRun.content))";

/// Google Docs API client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct DocsClient {
    inner: Arc<DocsClientInner>,
}

struct DocsClientInner {
    client: reqwest::Client,
    api_base: String,
    token_uri: String,
    credentials: GoogleCredentials,
    /// Cached service-account token.
    token: RwLock<Option<GoogleToken>>,
}

impl std::fmt::Debug for DocsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsClient")
            .field("api_base", &self.inner.api_base)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl DocsClient {
    /// Create a new Google Docs client.
    ///
    /// `api_base` and `token_uri` are normally [`DEFAULT_API_BASE`] and
    /// [`DEFAULT_TOKEN_URI`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        credentials: GoogleCredentials,
        api_base: impl Into<String>,
        token_uri: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DocsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocsError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(DocsClientInner {
                client,
                api_base: api_base.into().trim_end_matches('/').to_string(),
                token_uri: token_uri.into(),
                credentials,
                token: RwLock::new(None),
            }),
        })
    }

    /// Fetch a document's structure and revision.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the document cannot be read.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document(&self, document_id: &DocumentId) -> Result<Document, DocsError> {
        let url = format!("{}/v1/documents/{}", self.inner.api_base, document_id);
        let access_token = self.access_token().await?;

        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(access_token.expose_secret())
            .query(&[("fields", DOCUMENT_FIELDS)])
            .send()
            .await?;

        let document: Document = self.handle_response(response).await?;
        debug!(revision_id = ?document.revision_id, "Fetched document");
        Ok(document)
    }

    /// Apply a batch update to a document.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Google rejects the batch. A
    /// stale `requiredRevisionId` is rejected with a 400.
    #[instrument(skip(self, batch), fields(document_id = %document_id, requests = batch.operations.len()))]
    pub async fn batch_update(
        &self,
        document_id: &DocumentId,
        batch: &EditBatch,
    ) -> Result<BatchUpdateResponse, DocsError> {
        let url = format!(
            "{}/v1/documents/{}:batchUpdate",
            self.inner.api_base, document_id
        );
        let access_token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(access_token.expose_secret())
            .json(&convert_batch(batch))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a bearer token, minting a new one if the cached token expired.
    async fn access_token(&self) -> Result<SecretString, DocsError> {
        let (client_email, private_key) = match &self.inner.credentials {
            GoogleCredentials::AccessToken(token) => return Ok(token.clone()),
            GoogleCredentials::ServiceAccount {
                client_email,
                private_key,
            } => (client_email, private_key),
        };

        if let Some(token) = self.inner.token.read().await.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let mut guard = self.inner.token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let token = exchange_service_account_token(
            &self.inner.client,
            &self.inner.token_uri,
            client_email,
            private_key,
        )
        .await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);

        Ok(access_token)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DocsError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| DocsError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse error response from the Google API.
    async fn parse_error(&self, response: reqwest::Response) -> DocsError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return DocsError::RateLimited(retry_after);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(body);

        match status {
            401 | 403 => DocsError::Unauthorized(message),
            404 => DocsError::NotFound(message),
            _ => DocsError::Api { status, message },
        }
    }
}

#[async_trait]
impl DocumentService for DocsClient {
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentSnapshot, DocsError> {
        let document = self.get_document(document_id).await?;
        Ok(convert_document(document))
    }

    async fn update(&self, document_id: &DocumentId, batch: &EditBatch) -> Result<(), DocsError> {
        self.batch_update(document_id, batch).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use checkmark_core::{DocumentRange, ItemLocator};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    const TEST_KEY: &str = include_str!("testdata/service_account_key.pem");

    fn token_client(server: &ServerGuard) -> DocsClient {
        DocsClient::new(
            GoogleCredentials::AccessToken(SecretString::from("ya29.static")),
            server.url(),
            format!("{}/token", server.url()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn doc_id() -> DocumentId {
        DocumentId::parse("DOC123").unwrap()
    }

    fn document_body() -> serde_json::Value {
        json!({
            "documentId": "DOC123",
            "revisionId": "rev-7",
            "body": {
                "content": [
                    { "endIndex": 1, "sectionBreak": {} },
                    {
                        "startIndex": 1,
                        "endIndex": 14,
                        "paragraph": {
                            "elements": [{
                                "startIndex": 1,
                                "endIndex": 14,
                                "textRun": { "content": "Write report\n" }
                            }]
                        }
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/documents/DOC123")
            .match_header("authorization", "Bearer ya29.static")
            .match_query(Matcher::UrlEncoded("fields".into(), DOCUMENT_FIELDS.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(document_body().to_string())
            .create_async()
            .await;

        let snapshot = token_client(&server).fetch(&doc_id()).await.unwrap();

        assert_eq!(snapshot.revision_id.as_deref(), Some("rev-7"));
        let range = snapshot.locate(ItemLocator::new(1)).unwrap();
        assert_eq!((range.start(), range.end()), (1, 13));
        assert_eq!(range.text(), "Write report");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/documents/DOC123")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = token_client(&server).fetch(&doc_id()).await;
        match result {
            Err(DocsError::NotFound(message)) => {
                assert_eq!(message, "Requested entity was not found.");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_forbidden() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/documents/DOC123")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let result = token_client(&server).fetch(&doc_id()).await;
        assert!(matches!(result, Err(DocsError::Unauthorized(m)) if m == "forbidden"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/documents/DOC123")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "12")
            .create_async()
            .await;

        let result = token_client(&server).fetch(&doc_id()).await;
        assert!(matches!(result, Err(DocsError::RateLimited(12))));
    }

    #[tokio::test]
    async fn test_update_sends_batch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/documents/DOC123:batchUpdate")
            .match_header("authorization", "Bearer ya29.static")
            .match_body(Matcher::PartialJson(json!({
                "requests": [
                    { "updateTextStyle": { "range": { "startIndex": 1, "endIndex": 13 }, "fields": "backgroundColor" } },
                    { "insertText": { "location": { "index": 1 }, "text": "✅ " } }
                ],
                "writeControl": { "requiredRevisionId": "rev-7" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "documentId": "DOC123", "replies": [{}, {}] }).to_string())
            .create_async()
            .await;

        let range = DocumentRange::new(1, 13, "Write report").unwrap();
        let batch = EditBatch::mark_complete(&range, Some("rev-7".to_string()));
        token_client(&server).update(&doc_id(), &batch).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_stale_revision_is_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/documents/DOC123:batchUpdate")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "error": { "code": 400, "message": "The required revision ID does not match the latest revision.", "status": "FAILED_PRECONDITION" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let range = DocumentRange::new(1, 13, "Write report").unwrap();
        let batch = EditBatch::mark_complete(&range, Some("rev-6".to_string()));
        let result = token_client(&server).update(&doc_id(), &batch).await;

        assert!(matches!(result, Err(DocsError::Api { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_service_account_token_is_cached() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.minted","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;
        let doc_mock = server
            .mock("GET", "/v1/documents/DOC123")
            .match_header("authorization", "Bearer ya29.minted")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(document_body().to_string())
            .expect(2)
            .create_async()
            .await;

        let client = DocsClient::new(
            GoogleCredentials::ServiceAccount {
                client_email: "bot@project.iam.gserviceaccount.com".to_string(),
                private_key: SecretString::from(TEST_KEY),
            },
            server.url(),
            format!("{}/token", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();

        client.fetch(&doc_id()).await.unwrap();
        client.fetch(&doc_id()).await.unwrap();

        token_mock.assert_async().await;
        doc_mock.assert_async().await;
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let client = DocsClient::new(
            GoogleCredentials::AccessToken(SecretString::from("ya29.static")),
            DEFAULT_API_BASE,
            DEFAULT_TOKEN_URI,
            Duration::from_secs(5),
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("docs.googleapis.com"));
        assert!(!debug.contains("ya29"));
    }
}
