//! `/addtask` slash command parsing.
//!
//! Slack posts slash commands form-encoded. The command text is
//! `<documentId> <itemIndex> [label...]`.

use checkmark_core::{DocumentId, ItemLocator};
use thiserror::Error;
use url::form_urlencoded;

/// Fields of a slash-command request used by the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashCommand {
    /// The command, e.g. `/addtask`.
    pub command: String,
    /// Text typed after the command.
    pub text: String,
    /// Slack user who ran the command.
    pub user_id: String,
}

impl SlashCommand {
    /// Read the command fields from a form-encoded body.
    ///
    /// Missing fields are left empty.
    #[must_use]
    pub fn from_form(body: &[u8]) -> Self {
        let mut command = Self::default();
        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "command" => command.command = value.into_owned(),
                "text" => command.text = value.into_owned(),
                "user_id" => command.user_id = value.into_owned(),
                _ => {}
            }
        }
        command
    }
}

/// Errors in the `/addtask` text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing document id")]
    MissingDocumentId,
    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),
    #[error("missing item index")]
    MissingItemIndex,
    #[error("item index must be a non-negative number, got {0:?}")]
    InvalidItemIndex(String),
}

/// A parsed `/addtask` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTask {
    pub document_id: DocumentId,
    pub item_locator: ItemLocator,
    pub label: String,
}

impl AddTask {
    /// Parse the command text.
    ///
    /// The label defaults to `Item <index>` when omitted.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing the first bad argument.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut words = text.split_whitespace();

        let document_id = words.next().ok_or(CommandError::MissingDocumentId)?;
        let document_id = DocumentId::parse(document_id)
            .map_err(|e| CommandError::InvalidDocumentId(e.to_string()))?;

        let index = words.next().ok_or(CommandError::MissingItemIndex)?;
        let item_locator = index
            .parse::<u32>()
            .map(ItemLocator::new)
            .map_err(|_| CommandError::InvalidItemIndex(index.to_string()))?;

        let label = words.collect::<Vec<_>>().join(" ");
        let label = if label.is_empty() {
            format!("Item {item_locator}")
        } else {
            label
        };

        Ok(Self {
            document_id,
            item_locator,
            label,
        })
    }
}
