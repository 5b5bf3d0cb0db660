use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::approval::{PayloadError, TransitionError};
use crate::notification::slack::SlackError;

/// Errors returned to Slack at the HTTP boundary, before any handler runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request signature: {0}")]
    InvalidSignature(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, msg) = match &self {
            AppError::InvalidSignature(reason) => {
                tracing::warn!(reason, "rejected slack request with bad signature");
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication_error",
                    "invalid request signature".to_string(),
                )
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                msg.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}

/// A failed step inside one of the approval handlers.
///
/// These never reach the user: the dispatcher logs them once and drops them.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("directory fetch failed: {0}")]
    Directory(#[source] SlackError),

    #[error("failed to open {view} view: {source}")]
    OpenView {
        view: &'static str,
        #[source]
        source: SlackError,
    },

    #[error("failed to send {message} message: {source}")]
    SendMessage {
        message: &'static str,
        #[source]
        source: SlackError,
    },

    #[error("failed to update approver message: {0}")]
    UpdateMessage(#[source] SlackError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("interaction is missing {0}")]
    MissingField(&'static str),
}

impl WorkflowError {
    /// Short tag naming the step that failed, for log fields.
    pub fn step(&self) -> &'static str {
        match self {
            WorkflowError::Directory(_) => "directory_fetch",
            WorkflowError::OpenView { .. } => "open_view",
            WorkflowError::SendMessage { .. } => "send_message",
            WorkflowError::UpdateMessage(_) => "update_message",
            WorkflowError::Payload(_) => "payload",
            WorkflowError::Transition(_) => "transition",
            WorkflowError::MissingField(_) => "missing_field",
        }
    }
}
