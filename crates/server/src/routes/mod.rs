//! HTTP route handlers.
//!
//! # Routes
//!
//! - `POST /api/slack/interactions` - Button clicks (also `POST /api/task-complete`)
//! - `POST /api/slack/commands` - `/addtask` slash command
//!
//! `/health` is mounted by [`build_router`](crate::build_router).

pub mod slack;

use axum::Router;

use crate::state::AppState;

/// Build all application routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(slack::router())
}
