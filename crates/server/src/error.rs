//! Unified error handling for route handlers.
//!
//! Route handlers return `Result<T, AppError>`. The only failure a Slack
//! request sees synchronously is a rejected signature; the reason is logged
//! and never sent back.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::slack::VerificationFailure;

/// Application-level error type for the webhook server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Slack signature or timestamp check failed.
    #[error("Verification failed: {0}")]
    VerificationFailed(#[from] VerificationFailure),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::VerificationFailed(reason) => {
                tracing::warn!(reason = %reason, "Rejected unverified Slack request");
                (StatusCode::BAD_REQUEST, "Verification failed").into_response()
            }
        }
    }
}
