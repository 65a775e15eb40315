//! Slack message builders for the completion flow.
//!
//! Provides factory functions for:
//! - The task message with its "Mark as complete" button (`/addtask`)
//! - The confirmation that replaces the task message once the item is done
//! - The ephemeral notice sent when an item could not be completed
//! - The slash-command usage hint

use checkmark_core::{DocumentId, ItemLocator, Stage};

use super::types::{Accessory, Block, ButtonStyle, ResponseMessage, ResponseType, Text};

/// Action ID of the completion button.
pub const MARK_DONE_ACTION_ID: &str = "mark_done";

/// Escape text for inclusion in a `mrkdwn` field.
///
/// Slack treats `<...>` as links and mentions (`<!channel>`, `<@U123>`), so
/// document and user text must not reach it unescaped.
#[must_use]
pub fn escape_mrkdwn(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build the task message posted by `/addtask`.
///
/// The button's value carries the document and item so the interaction
/// handler needs no stored state.
#[must_use]
pub fn build_task_message(
    user_id: &str,
    label: &str,
    document_id: &DocumentId,
    item_locator: ItemLocator,
) -> ResponseMessage {
    let value = serde_json::json!({
        "documentId": document_id,
        "itemLocator": item_locator,
    })
    .to_string();
    let label = escape_mrkdwn(label);

    ResponseMessage {
        replace_original: None,
        response_type: Some(ResponseType::InChannel),
        blocks: vec![Block::Section {
            text: Text::mrkdwn(format!("*Task for <@{user_id}>: {label}*")),
            accessory: Some(Accessory::Button {
                text: Text::plain("Mark as complete"),
                action_id: MARK_DONE_ACTION_ID.to_string(),
                value: Some(value),
                style: Some(ButtonStyle::Primary),
            }),
        }],
        text: Some(format!("Task for <@{user_id}>: {label}")),
    }
}

/// Build the confirmation that replaces the task message.
#[must_use]
pub fn build_completed_message(completed_text: &str) -> ResponseMessage {
    let text = escape_mrkdwn(completed_text);

    ResponseMessage {
        replace_original: Some(true),
        response_type: None,
        blocks: vec![Block::Section {
            text: Text::mrkdwn(&text),
            accessory: None,
        }],
        text: Some(text),
    }
}

/// Build the ephemeral notice for a run that failed after the click.
///
/// Leaves the original message (and its button) in place so the user can
/// try again.
#[must_use]
pub fn build_failure_notice(stage: Stage) -> ResponseMessage {
    let reason = match stage {
        Stage::LocatingRange => "the item is no longer where the button expects it",
        Stage::FetchingDocument => "the document could not be read",
        _ => "the document could not be updated",
    };
    let text = format!("⚠️ Could not mark this item as complete: {reason}.");

    ResponseMessage {
        replace_original: Some(false),
        response_type: Some(ResponseType::Ephemeral),
        blocks: vec![Block::Section {
            text: Text::mrkdwn(&text),
            accessory: None,
        }],
        text: Some(text),
    }
}

/// Build the ephemeral usage hint for `/addtask`.
#[must_use]
pub fn build_usage_message(command: &str, problem: &str) -> ResponseMessage {
    ResponseMessage {
        replace_original: None,
        response_type: Some(ResponseType::Ephemeral),
        blocks: vec![
            Block::Section {
                text: Text::mrkdwn(format!(
                    "Usage: `{command} <documentId> <itemIndex> [label]`"
                )),
                accessory: None,
            },
            Block::Context {
                elements: vec![Text::mrkdwn(escape_mrkdwn(problem))],
            },
        ],
        text: Some(format!("Usage: {command} <documentId> <itemIndex> [label]")),
    }
}
