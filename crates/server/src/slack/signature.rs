//! Slack request signature verification.
//!
//! Implements Slack's signing scheme:
//! <https://api.slack.com/authentication/verifying-requests-from-slack>
//!
//! The signature covers `v0:{timestamp}:{raw body}`, so verification must run
//! on the body bytes exactly as received, before any form or JSON parsing.

use axum::body::Bytes;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Header carrying the request timestamp (Unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Maximum distance between the request timestamp and now (5 minutes).
pub const TIMESTAMP_TOLERANCE_SECS: u64 = 300;

/// Signing scheme version prefix.
const SIGNATURE_VERSION: &str = "v0";

type HmacSha256 = Hmac<Sha256>;

/// Why a request failed verification.
///
/// Only logged. The caller always sees the same generic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("missing signature header")]
    MissingSignature,
    #[error("missing timestamp header")]
    MissingTimestamp,
    #[error("timestamp is not a Unix time")]
    InvalidTimestamp,
    #[error("timestamp outside the replay window")]
    StaleTimestamp,
    #[error("signature mismatch")]
    SignatureMismatch,
}

/// A request whose signature and timestamp have been checked.
///
/// Only [`SignatureVerifier`] constructs one.
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    body: Bytes,
    signature: String,
    timestamp: String,
}

impl VerifiedRequest {
    /// The raw request body, exactly as signed.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The `X-Slack-Signature` header value.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The `X-Slack-Request-Timestamp` header value.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Key identifying this exact delivery.
    #[must_use]
    pub fn delivery_key(&self) -> String {
        format!("{}:{}", self.timestamp, self.signature)
    }
}

/// Verifies inbound Slack requests against the app's signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier for the given signing secret.
    #[must_use]
    pub const fn new(signing_secret: SecretString) -> Self {
        Self { signing_secret }
    }

    /// Verify a request against the current time.
    ///
    /// # Errors
    ///
    /// Returns the reason verification failed.
    pub fn verify_request(
        &self,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<VerifiedRequest, VerificationFailure> {
        self.verify_request_at(headers, body, Utc::now())
    }

    /// Verify a request against an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns the reason verification failed.
    #[instrument(skip_all)]
    pub fn verify_request_at(
        &self,
        headers: &HeaderMap,
        body: Bytes,
        now: DateTime<Utc>,
    ) -> Result<VerifiedRequest, VerificationFailure> {
        let signature =
            header_str(headers, SIGNATURE_HEADER).ok_or(VerificationFailure::MissingSignature)?;
        let timestamp =
            header_str(headers, TIMESTAMP_HEADER).ok_or(VerificationFailure::MissingTimestamp)?;

        check(
            &body,
            Some(signature),
            Some(timestamp),
            &self.signing_secret,
            now,
        )?;

        Ok(VerifiedRequest {
            signature: signature.to_owned(),
            timestamp: timestamp.to_owned(),
            body,
        })
    }
}

/// Verify a Slack signature.
///
/// Returns `false` for a missing header, a timestamp more than
/// [`TIMESTAMP_TOLERANCE_SECS`] away from `now`, or a signature that does not
/// match. Never panics and holds no state.
#[must_use]
pub fn verify(
    raw_body: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    signing_secret: &SecretString,
    now: DateTime<Utc>,
) -> bool {
    check(raw_body, signature, timestamp, signing_secret, now).is_ok()
}

/// Verify a Slack signature, reporting why it failed.
///
/// # Errors
///
/// Returns the first check that failed.
pub fn check(
    raw_body: &[u8],
    signature: Option<&str>,
    timestamp: Option<&str>,
    signing_secret: &SecretString,
    now: DateTime<Utc>,
) -> Result<(), VerificationFailure> {
    let signature = signature.ok_or(VerificationFailure::MissingSignature)?;
    let timestamp = timestamp.ok_or(VerificationFailure::MissingTimestamp)?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| VerificationFailure::InvalidTimestamp)?;

    let skew = now
        .timestamp()
        .checked_sub(ts)
        .map(i64::unsigned_abs)
        .ok_or(VerificationFailure::StaleTimestamp)?;
    if skew > TIMESTAMP_TOLERANCE_SECS {
        return Err(VerificationFailure::StaleTimestamp);
    }

    // Anything that is not "v0=<hex>" can never match; fail closed.
    let provided = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
        .and_then(|digest| hex::decode(digest).ok())
        .ok_or(VerificationFailure::SignatureMismatch)?;

    // verify_slice compares in constant time and rejects length mismatches.
    signing_mac(signing_secret.expose_secret().as_bytes(), timestamp, raw_body)
        .verify_slice(&provided)
        .map_err(|_| VerificationFailure::SignatureMismatch)
}

/// Compute the `v0=<hex>` signature Slack would send for a request.
#[must_use]
pub fn compute_signature(signing_secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
    let digest = signing_mac(signing_secret.as_bytes(), timestamp, raw_body)
        .finalize()
        .into_bytes();
    format!("{SIGNATURE_VERSION}={}", hex::encode(digest))
}

fn signing_mac(key: &[u8], timestamp: &str, raw_body: &[u8]) -> HmacSha256 {
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);
    mac
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
