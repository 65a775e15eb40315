//! Slack `response_url` client.
//!
//! Interaction responses do not need the Web API or a bot token: Slack hands
//! out a short-lived `response_url` with every interaction, and posting a
//! message there replaces (or adds to) the message that held the button.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::error::SlackError;
use super::types::ResponseMessage;
use crate::services::Notifier;

/// Client for posting messages to Slack `response_url`s.
#[derive(Debug, Clone)]
pub struct SlackClient {
    /// HTTP client.
    client: Client,
}

impl SlackClient {
    /// Create a new Slack client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(timeout: Duration) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SlackError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Respond to a `response_url` (for interaction responses).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Slack answers with a
    /// non-success status.
    #[instrument(skip(self, message), fields(host = response_url.host_str().unwrap_or_default()))]
    pub async fn respond_to_url(
        &self,
        response_url: &Url,
        message: &ResponseMessage,
    ) -> Result<(), SlackError> {
        let response = self
            .client
            .post(response_url.clone())
            .json(message)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Response { status, body });
        }

        debug!("Responded to Slack response_url");

        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn post(&self, callback_url: &Url, message: &ResponseMessage) -> Result<(), SlackError> {
        self.respond_to_url(callback_url, message).await
    }
}
