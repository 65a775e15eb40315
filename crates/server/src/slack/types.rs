//! Slack Block Kit and interaction types.
//!
//! These types represent the subset of the Slack API needed for the
//! completion flow: message blocks with a button, `response_url` messages,
//! and the interaction payload Slack posts when the button is clicked.
//!
//! See: <https://api.slack.com/block-kit>

use serde::{Deserialize, Serialize};

/// Block Kit block types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Section block with text and optional accessory.
    Section {
        text: Text,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Accessory>,
    },
    /// Context block with small muted text.
    Context { elements: Vec<Text> },
}

/// Text object types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    /// Plain text (no formatting).
    PlainText { text: String, emoji: bool },
    /// Markdown text (supports formatting).
    Mrkdwn { text: String },
}

impl Text {
    /// Create a plain text object.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    /// Create a markdown text object.
    #[must_use]
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// Accessory elements for section blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessory {
    /// Button accessory.
    Button {
        text: Text,
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

/// Button style (affects color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    /// Green primary button.
    Primary,
}

/// Who sees a message posted in response to a command or interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Everyone in the channel.
    InChannel,
    /// Only the user who triggered it.
    Ephemeral,
}

/// Message sent to a `response_url` or as a slash-command response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMessage {
    /// Replace the message that holds the clicked control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_original: Option<bool>,
    /// Visibility of a new message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Message blocks.
    pub blocks: Vec<Block>,
    /// Plain text fallback for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// =============================================================================
// Inbound Types
// =============================================================================

/// Slack interaction payload from button clicks.
///
/// Every field is optional here; which ones are required is decided by the
/// decoder so each missing piece maps to its own error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionPayload {
    /// Type of interaction (e.g. "`block_actions`").
    #[serde(rename = "type", default)]
    pub interaction_type: Option<String>,
    /// User who triggered the interaction.
    #[serde(default)]
    pub user: Option<InteractionUser>,
    /// Actions that were triggered.
    #[serde(default)]
    pub actions: Option<Vec<InteractionAction>>,
    /// Response URL for replacing the message.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// User who triggered an interaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionUser {
    /// Slack user ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
}

/// Action that was triggered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionAction {
    /// Action ID (set when creating the button).
    #[serde(default)]
    pub action_id: Option<String>,
    /// Value attached to the action. Slack sends a string; anything else is
    /// kept so the decoder can reject it at the right stage.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_message_serialization() {
        let message = ResponseMessage {
            replace_original: Some(true),
            response_type: None,
            blocks: vec![Block::Section {
                text: Text::mrkdwn("✅ Buy milk"),
                accessory: None,
            }],
            text: None,
        };

        assert_eq!(
            serde_json::to_value(&message).ok(),
            Some(json!({
                "replace_original": true,
                "blocks": [{
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": "✅ Buy milk" }
                }]
            }))
        );
    }

    #[test]
    fn test_button_serialization() {
        let block = Block::Section {
            text: Text::mrkdwn("*Task*"),
            accessory: Some(Accessory::Button {
                text: Text::plain("Mark as complete"),
                action_id: "mark_done".to_string(),
                value: Some("{}".to_string()),
                style: Some(ButtonStyle::Primary),
            }),
        };

        assert_eq!(
            serde_json::to_value(&block).ok(),
            Some(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": "*Task*" },
                "accessory": {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Mark as complete", "emoji": true },
                    "action_id": "mark_done",
                    "value": "{}",
                    "style": "primary"
                }
            }))
        );
    }

    #[test]
    fn test_interaction_payload_tolerates_missing_fields() {
        let payload: InteractionPayload = serde_json::from_value(json!({})).unwrap_or_default();
        assert!(payload.actions.is_none());
        assert!(payload.response_url.is_none());
    }
}
