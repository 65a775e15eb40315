//! Google API authentication.
//!
//! Service accounts authenticate with the OAuth 2.0 JWT bearer grant: a
//! short-lived RS256 assertion signed with the account's private key is
//! exchanged at the token endpoint for an access token.
//!
//! See: <https://developers.google.com/identity/protocols/oauth2/service-account>

use std::fmt;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::DocsError;

/// Google OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope granting read/write access to Google Docs.
pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// How Google API calls are authorised.
#[derive(Clone)]
pub enum GoogleCredentials {
    /// Service account key; tokens are minted and refreshed automatically.
    ServiceAccount {
        client_email: String,
        private_key: SecretString,
    },
    /// A pre-issued access token, used as-is.
    AccessToken(SecretString),
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceAccount { client_email, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("private_key", &"[REDACTED]")
                .finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"[REDACTED]").finish(),
        }
    }
}

/// Access token obtained from the token endpoint.
#[derive(Debug, Clone)]
pub struct GoogleToken {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

impl GoogleToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}

/// Claims of the service-account assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Successful token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

/// Error response from the token endpoint.
#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Build a signed JWT assertion for `client_email`.
///
/// # Errors
///
/// Returns `DocsError::Auth` if the private key is not a valid RSA PEM key.
pub fn build_assertion(
    client_email: &str,
    private_key: &SecretString,
    token_uri: &str,
    now: i64,
) -> Result<String, DocsError> {
    let key = EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
        .map_err(|e| DocsError::Auth(format!("Invalid service account key: {e}")))?;

    let claims = AssertionClaims {
        iss: client_email,
        scope: DOCUMENTS_SCOPE,
        aud: token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| DocsError::Auth(format!("Failed to sign assertion: {e}")))
}

/// Exchange a service-account assertion for an access token.
///
/// # Errors
///
/// Returns `DocsError::Auth` if the key is invalid or the token endpoint
/// rejects the assertion.
#[instrument(skip(client, private_key), fields(client_email = %client_email))]
pub async fn exchange_service_account_token(
    client: &reqwest::Client,
    token_uri: &str,
    client_email: &str,
    private_key: &SecretString,
) -> Result<GoogleToken, DocsError> {
    let now = chrono::Utc::now().timestamp();
    let assertion = build_assertion(client_email, private_key, token_uri, now)?;

    let response = client
        .post(token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DocsError::Parse(format!("Failed to parse token response: {e}")))?;

        Ok(GoogleToken {
            access_token: SecretString::from(token.access_token),
            expires_at: now + token.expires_in,
        })
    } else {
        let error_response: TokenErrorResponse =
            response.json().await.unwrap_or(TokenErrorResponse {
                error: None,
                error_description: None,
            });

        let message = error_response
            .error_description
            .or(error_response.error)
            .unwrap_or_else(|| "Unknown error".to_string());

        Err(DocsError::Auth(format!("HTTP {status}: {message}")))
    }
}
