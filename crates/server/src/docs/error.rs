//! Google Docs errors.

use thiserror::Error;

/// Errors that can occur when interacting with the Google Docs API.
#[derive(Debug, Error)]
pub enum DocsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Document not found (or not shared with the service account).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials rejected or missing permission on the document.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by Google.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Obtaining an access token failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
