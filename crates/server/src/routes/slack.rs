//! Slack webhook handlers.
//!
//! Both endpoints verify the Slack signature over the raw body before
//! anything else is read. Button clicks are acknowledged as soon as they
//! verify; the completion itself runs on a detached task.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::slack::{
    AddTask, ResponseMessage, SlashCommand, build_task_message, build_usage_message,
};
use crate::state::AppState;

/// Create Slack webhook routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/slack/interactions", post(handle_interaction))
        .route("/api/task-complete", post(handle_interaction))
        .route("/api/slack/commands", post(handle_command))
}

/// Handle a "Mark as complete" button click.
///
/// Returns 200 once the signature verifies, before the document is touched.
/// A repeat delivery of the same signed request is acknowledged again but
/// starts no second run.
#[instrument(skip_all)]
async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let request = state.verifier().verify_request(&headers, body)?;
    debug!("Slack signature verified");

    if let Some(guard) = state.delivery_guard()
        && !guard.first_delivery(request.delivery_key()).await
    {
        info!(
            timestamp = request.timestamp(),
            "Duplicate delivery acknowledged without a new run"
        );
        return Ok(StatusCode::OK);
    }

    // Detached: the run logs its own outcome
    let _ = state.orchestrator().spawn(request);

    Ok(StatusCode::OK)
}

/// Handle the `/addtask` slash command.
///
/// Replies with the task message, or an ephemeral usage hint when the
/// command text cannot be parsed.
#[instrument(skip_all)]
async fn handle_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ResponseMessage>, AppError> {
    let request = state.verifier().verify_request(&headers, body)?;
    let command = SlashCommand::from_form(request.body());

    let message = match AddTask::parse(&command.text) {
        Ok(task) => {
            info!(
                document_id = %task.document_id,
                item_locator = %task.item_locator,
                "Posting task message"
            );
            build_task_message(
                &command.user_id,
                &task.label,
                &task.document_id,
                task.item_locator,
            )
        }
        Err(e) => {
            debug!(error = %e, "Unparseable slash command");
            build_usage_message(&command.command, &e.to_string())
        }
    };

    Ok(Json(message))
}
