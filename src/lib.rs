//! Slack approval bot: library crate shared by the binary and integration tests.
//!
//! A requester runs the slash command, picks an approver and gives a reason;
//! the approver gets a DM with Approve/Reject buttons, and the outcome is sent
//! back to the requester. Nothing is persisted: the pending request lives in
//! the button payload of the approver's message.

use zeroize::Zeroizing;

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod workflow;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub workflow: workflow::ApprovalWorkflow,
    pub signing_secret: Zeroizing<String>,
    /// Slash command name, e.g. `/approval-test`.
    pub command: String,
}
