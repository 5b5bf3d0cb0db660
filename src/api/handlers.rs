use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form};

use crate::errors::{AppError, WorkflowError};
use crate::models::interaction::{
    InteractionForm, InteractionPayload, SlashCommand, REQUEST_MODAL_CALLBACK_ID,
};
use crate::AppState;

/// Log a failed handler run once and drop the error.
///
/// Returns the value on success so callers (and tests) can inspect it.
pub fn report<T>(handler: &'static str, result: Result<T, WorkflowError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!(handler, step = e.step(), error = %e, "approval handler failed");
            None
        }
    }
}

/// `POST /slack/commands`. Acks with an empty 200 and opens the form in a
/// spawned task.
pub async fn slash_command(
    State(state): State<Arc<AppState>>,
    Form(cmd): Form<SlashCommand>,
) -> StatusCode {
    if cmd.is_ssl_check() {
        return StatusCode::OK;
    }
    if cmd.command != state.command {
        tracing::warn!(command = %cmd.command, "ignoring unknown slash command");
        return StatusCode::OK;
    }

    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        report("slash_command", workflow.handle_command(&cmd).await);
    });
    StatusCode::OK
}

/// `POST /slack/interactions`: form submissions and button presses.
pub async fn interaction(
    State(state): State<Arc<AppState>>,
    Form(form): Form<InteractionForm>,
) -> Result<StatusCode, AppError> {
    let payload: InteractionPayload = serde_json::from_str(&form.payload)
        .map_err(|e| AppError::BadRequest(format!("invalid interaction payload: {}", e)))?;

    let workflow = state.workflow.clone();
    match payload {
        InteractionPayload::ViewSubmission(submission) => {
            if submission.view.callback_id != REQUEST_MODAL_CALLBACK_ID {
                tracing::debug!(callback_id = %submission.view.callback_id, "ignoring view submission");
                return Ok(StatusCode::OK);
            }
            tokio::spawn(async move {
                report("view_submission", workflow.handle_submission(&submission).await);
            });
        }
        InteractionPayload::BlockActions(actions) => {
            tokio::spawn(async move {
                report("block_actions", workflow.handle_decision(&actions).await);
            });
        }
        InteractionPayload::Unsupported => {
            tracing::debug!("ignoring unsupported interaction type");
        }
    }

    Ok(StatusCode::OK)
}
