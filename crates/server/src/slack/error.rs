//! Slack-related errors.

use thiserror::Error;

/// Errors that can occur when talking to Slack.
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP request failed.
    #[error("Slack request failed: {0}")]
    Request(String),

    /// Slack answered with a non-success status.
    #[error("Slack response error: {status} {body}")]
    Response { status: u16, body: String },

    /// Configuration error.
    #[error("Slack configuration error: {0}")]
    Config(String),
}
