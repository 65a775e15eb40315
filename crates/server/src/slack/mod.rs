//! Slack integration for task completion.
//!
//! This module provides:
//! - [`SignatureVerifier`] for authenticating inbound webhooks
//! - [`decode`] for turning a button click into a [`CompletionRequest`](checkmark_core::CompletionRequest)
//! - [`SlackClient`] for posting to interaction `response_url`s
//! - Block Kit types and message builders
//! - `/addtask` slash command parsing
//!
//! # Flow
//!
//! 1. `/addtask <documentId> <itemIndex> [label]` posts a task message with a
//!    "Mark as complete" button
//! 2. A user clicks the button
//! 3. Webhook handler verifies the signature and acknowledges immediately
//! 4. The item is marked complete in the document in the background
//! 5. The task message is replaced with the completed text

mod client;
mod command;
mod error;
mod messages;
pub mod payload;
pub mod signature;
mod types;

pub use client::SlackClient;
pub use command::{AddTask, CommandError, SlashCommand};
pub use error::SlackError;
pub use messages::{
    MARK_DONE_ACTION_ID, build_completed_message, build_failure_notice, build_task_message,
    build_usage_message, escape_mrkdwn,
};
pub use payload::{CALLBACK_HOST, DecodeError, DecodedInteraction, decode, decode_interaction};
pub use signature::{
    SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, VerificationFailure, VerifiedRequest,
    compute_signature,
};
pub use types::{
    Accessory, Block, ButtonStyle, InteractionAction, InteractionPayload, InteractionUser,
    ResponseMessage, ResponseType, Text,
};
