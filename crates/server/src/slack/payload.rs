//! Decoding of button-click interaction payloads.
//!
//! Slack posts interactions as `application/x-www-form-urlencoded` with a
//! single `payload` field holding JSON. The clicked button's `value` is itself
//! a JSON string naming the document and item:
//!
//! ```text
//! payload={"actions":[{"value":"{\"documentId\":\"D1\",\"itemLocator\":3}"}],
//!          "response_url":"https://hooks.slack.com/actions/..."}
//! ```
//!
//! Each stage fails with its own [`DecodeError`] variant. Decoding never
//! panics, whatever the input bytes.

use checkmark_core::{CompletionRequest, DocumentId, ItemLocator};
use serde::Deserialize;
use thiserror::Error;
use url::{Url, form_urlencoded};

use super::types::InteractionPayload;

/// Name of the form field holding the interaction JSON.
const PAYLOAD_FIELD: &str = "payload";

/// Host every Slack `response_url` points at.
pub const CALLBACK_HOST: &str = "hooks.slack.com";

/// Reasons an interaction body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The form body has no `payload` field.
    #[error("form body has no payload field")]
    MissingPayload,

    /// The `payload` field is not a JSON object.
    #[error("payload is not valid JSON: {0}")]
    MalformedPayload(String),

    /// The payload has no actions.
    #[error("payload has no actions")]
    MissingAction,

    /// The first action's value does not name a document and item.
    #[error("action value is missing documentId or itemLocator: {0}")]
    MissingFields(String),

    /// The payload has no `response_url`.
    #[error("payload has no response_url")]
    MissingCallbackUrl,

    /// The `response_url` is not an https URL on the Slack hooks host.
    #[error("response_url is not an https URL on hooks.slack.com")]
    InvalidCallbackUrl,
}

/// The button's value, as written by the task message builder.
///
/// The original button format (`docId`/`taskIndex`) is accepted too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionValue {
    #[serde(alias = "docId")]
    document_id: DocumentId,
    #[serde(alias = "taskIndex")]
    item_locator: ItemLocator,
}

/// An interaction whose action has been decoded.
///
/// The callback URL is kept optional here: whether its absence is fatal is
/// the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInteraction {
    /// Document holding the item.
    pub document_id: DocumentId,
    /// Which item to complete.
    pub item_locator: ItemLocator,
    /// Raw `response_url`, if Slack sent one.
    pub response_url: Option<String>,
    /// Slack user who clicked, if present.
    pub user_id: Option<String>,
}

impl DecodedInteraction {
    /// Require a usable callback URL and build the completion request.
    ///
    /// # Errors
    ///
    /// Returns `MissingCallbackUrl` if there is no `response_url`, or
    /// `InvalidCallbackUrl` if it is not an https URL on [`CALLBACK_HOST`].
    pub fn into_completion_request(self) -> Result<CompletionRequest, DecodeError> {
        let raw = self
            .response_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(DecodeError::MissingCallbackUrl)?;

        let callback_url = Url::parse(&raw).map_err(|_| DecodeError::InvalidCallbackUrl)?;
        if callback_url.scheme() != "https" || callback_url.host_str() != Some(CALLBACK_HOST) {
            return Err(DecodeError::InvalidCallbackUrl);
        }

        Ok(CompletionRequest {
            document_id: self.document_id,
            item_locator: self.item_locator,
            callback_url,
        })
    }
}

/// Decode a form-encoded interaction body into a completion request.
///
/// # Errors
///
/// Returns the [`DecodeError`] of the first stage that failed.
pub fn decode(form_body: &[u8]) -> Result<CompletionRequest, DecodeError> {
    decode_interaction(form_body)?.into_completion_request()
}

/// Decode a form-encoded interaction body, leaving the callback URL optional.
///
/// # Errors
///
/// Returns the [`DecodeError`] of the first stage that failed.
pub fn decode_interaction(form_body: &[u8]) -> Result<DecodedInteraction, DecodeError> {
    let raw_payload = form_urlencoded::parse(form_body)
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value.into_owned())
        .ok_or(DecodeError::MissingPayload)?;

    let payload: InteractionPayload = serde_json::from_str(&raw_payload)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

    let action = payload
        .actions
        .as_deref()
        .and_then(<[_]>::first)
        .ok_or(DecodeError::MissingAction)?;

    let value = parse_action_value(action.value.as_ref())?;

    Ok(DecodedInteraction {
        document_id: value.document_id,
        item_locator: value.item_locator,
        response_url: payload.response_url,
        user_id: payload.user.and_then(|user| user.id),
    })
}

fn parse_action_value(value: Option<&serde_json::Value>) -> Result<ActionValue, DecodeError> {
    match value {
        Some(serde_json::Value::String(encoded)) => serde_json::from_str(encoded)
            .map_err(|e| DecodeError::MissingFields(e.to_string())),
        Some(object @ serde_json::Value::Object(_)) => {
            ActionValue::deserialize(object).map_err(|e| DecodeError::MissingFields(e.to_string()))
        }
        Some(_) => Err(DecodeError::MissingFields(
            "value is neither a string nor an object".to_string(),
        )),
        None => Err(DecodeError::MissingFields("action has no value".to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(payload: &serde_json::Value) -> Vec<u8> {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish()
            .into_bytes()
    }

    fn button_value(document_id: &str, item_locator: i64) -> String {
        json!({ "documentId": document_id, "itemLocator": item_locator }).to_string()
    }

    #[test]
    fn test_decode_valid_payload() {
        let body = form(&json!({
            "type": "block_actions",
            "user": { "id": "U123", "username": "ada" },
            "actions": [{ "action_id": "mark_done", "value": button_value("D1", 3) }],
            "response_url": "https://hooks.slack.com/actions/T1/1/abc"
        }));

        let request = decode(&body).unwrap();
        assert_eq!(request.document_id.as_str(), "D1");
        assert_eq!(request.item_locator, ItemLocator::new(3));
        assert_eq!(
            request.callback_url.as_str(),
            "https://hooks.slack.com/actions/T1/1/abc"
        );
    }

    #[test]
    fn test_decode_legacy_value_keys() {
        let body = form(&json!({
            "actions": [{ "value": json!({ "docId": "D9", "taskIndex": 2 }).to_string() }],
            "response_url": "https://hooks.slack.com/actions/T1/1/abc"
        }));

        let request = decode(&body).unwrap();
        assert_eq!(request.document_id.as_str(), "D9");
        assert_eq!(request.item_locator, ItemLocator::new(2));
    }

    #[test]
    fn test_decode_payload_not_first_field() {
        let mut body = b"token=abc&".to_vec();
        body.extend(form(&json!({
            "actions": [{ "value": button_value("D1", 0) }],
            "response_url": "https://hooks.slack.com/actions/x"
        })));

        assert!(decode(&body).is_ok());
    }

    #[test]
    fn test_decode_missing_payload() {
        assert_eq!(decode(b""), Err(DecodeError::MissingPayload));
        assert_eq!(decode(b"token=abc"), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn test_decode_malformed_payload() {
        assert!(matches!(
            decode(b"payload=%7Bnot-json"),
            Err(DecodeError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode(b"payload="),
            Err(DecodeError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode(b"payload=%5B1%2C2%5D"),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_missing_action() {
        let empty = form(&json!({ "actions": [], "response_url": "https://x.test/" }));
        assert_eq!(decode(&empty), Err(DecodeError::MissingAction));

        let absent = form(&json!({ "response_url": "https://x.test/" }));
        assert_eq!(decode(&absent), Err(DecodeError::MissingAction));
    }

    #[test]
    fn test_decode_missing_fields() {
        let cases = [
            json!({ "actions": [{}] }),
            json!({ "actions": [{ "value": "not json" }] }),
            json!({ "actions": [{ "value": json!({ "documentId": "D1" }).to_string() }] }),
            json!({ "actions": [{ "value": json!({ "itemLocator": 1 }).to_string() }] }),
            json!({ "actions": [{ "value": button_value("", 1) }] }),
            json!({ "actions": [{ "value": button_value("D1", -1) }] }),
            json!({ "actions": [{ "value": 42 }] }),
        ];

        for payload in cases {
            let result = decode(&form(&payload));
            assert!(
                matches!(result, Err(DecodeError::MissingFields(_))),
                "{payload} decoded to {result:?}"
            );
        }
    }

    #[test]
    fn test_decode_object_value() {
        let body = form(&json!({
            "actions": [{ "value": { "documentId": "D1", "itemLocator": 5 } }],
            "response_url": "https://hooks.slack.com/actions/x"
        }));
        assert_eq!(decode(&body).unwrap().item_locator, ItemLocator::new(5));
    }

    #[test]
    fn test_decode_interaction_keeps_missing_callback_optional() {
        let body = form(&json!({
            "user": { "id": "U1" },
            "actions": [{ "value": button_value("D1", 3) }]
        }));

        let interaction = decode_interaction(&body).unwrap();
        assert!(interaction.response_url.is_none());
        assert_eq!(interaction.user_id.as_deref(), Some("U1"));
        assert_eq!(
            interaction.into_completion_request(),
            Err(DecodeError::MissingCallbackUrl)
        );
    }

    #[test]
    fn test_decode_invalid_callback_url() {
        for url in [
            "not a url",
            "ftp://hooks.slack.com/x",
            "mailto:a@b.c",
            "http://hooks.slack.com/actions/T1/1/abc",
            "https://attacker.example/actions/T1/1/abc",
            "https://hooks.slack.com.attacker.example/x",
            "https://user@evil.example/hooks.slack.com",
        ] {
            let body = form(&json!({
                "actions": [{ "value": button_value("D1", 3) }],
                "response_url": url
            }));
            assert_eq!(
                decode(&body),
                Err(DecodeError::InvalidCallbackUrl),
                "{url} accepted"
            );
        }

        let blank = form(&json!({
            "actions": [{ "value": button_value("D1", 3) }],
            "response_url": "  "
        }));
        assert_eq!(decode(&blank), Err(DecodeError::MissingCallbackUrl));
    }

    #[test]
    fn test_decode_arbitrary_bytes_never_panics() {
        let inputs: [&[u8]; 8] = [
            b"\xff\xfe\xfd",
            b"payload=%ff%fe",
            b"payload=%7B%22actions%22%3Anull%7D",
            b"&&&===",
            b"payload",
            b"payload=%",
            b"payload=null",
            b"payload=%7B%22actions%22%3A%5Bnull%5D%7D",
        ];
        for input in inputs {
            assert!(decode(input).is_err());
        }
    }
}
