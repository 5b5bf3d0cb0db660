//! The approval workflow: command entry, form submission and decision.
//!
//! Each handler returns a typed result for the step that failed. Logging
//! and swallowing happen once, at the dispatcher.

use std::sync::Arc;

use crate::cache::DirectoryCache;
use crate::errors::WorkflowError;
use crate::models::approval::{ApprovalPayload, ApprovalRequest, ApprovalStatus, Decision};
use crate::models::directory::{eligible_approvers, MAX_SELECT_OPTIONS};
use crate::models::interaction::{BlockActions, SlashCommand, ViewSubmission};
use crate::notification::blocks;
use crate::notification::slack::{PostedMessage, SlackApi};

/// What a decision handler run accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub status: ApprovalStatus,
    pub requester: String,
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    slack: Arc<dyn SlackApi>,
    directory: DirectoryCache,
}

impl ApprovalWorkflow {
    pub fn new(slack: Arc<dyn SlackApi>, directory: DirectoryCache) -> Self {
        Self { slack, directory }
    }

    pub fn directory(&self) -> &DirectoryCache {
        &self.directory
    }

    /// Slash command: show the requester a form to pick an approver.
    pub async fn handle_command(&self, cmd: &SlashCommand) -> Result<(), WorkflowError> {
        let snapshot = self
            .directory
            .get_directory()
            .await
            .map_err(WorkflowError::Directory)?;

        let mut options = eligible_approvers(&snapshot.entries, &cmd.user_id);
        if options.len() > MAX_SELECT_OPTIONS {
            tracing::warn!(
                eligible = options.len(),
                shown = MAX_SELECT_OPTIONS,
                "too many approvers for one select, truncating"
            );
            options.truncate(MAX_SELECT_OPTIONS);
        }

        let view = blocks::request_modal(&options);
        self.slack
            .open_view(&cmd.trigger_id, &view)
            .await
            .map_err(|source| WorkflowError::OpenView {
                view: "request",
                source,
            })?;

        tracing::info!(
            requester = %cmd.user_id,
            approvers = options.len(),
            "opened approval request form"
        );
        Ok(())
    }

    /// Form submitted: DM the approver, then confirm to the requester.
    ///
    /// The requester is whoever submitted the form. The confirmation is only
    /// shown once the approver has actually been notified; a failed
    /// confirmation does not undo the notification.
    pub async fn handle_submission(
        &self,
        submission: &ViewSubmission,
    ) -> Result<PostedMessage, WorkflowError> {
        let approver = submission
            .approver()
            .ok_or(WorkflowError::MissingField("approver"))?;
        let reason = submission
            .reason()
            .ok_or(WorkflowError::MissingField("reason"))?;

        let request = ApprovalRequest::new(submission.user.id.as_str(), approver, reason);
        let payload = request.payload().encode()?;

        let posted = self
            .slack
            .post_message(
                &request.approver,
                &blocks::approver_notification(&request, &payload),
            )
            .await
            .map_err(|source| WorkflowError::SendMessage {
                message: "approver notification",
                source,
            })?;

        tracing::info!(
            requester = %request.requester,
            approver = %request.approver,
            channel = %posted.channel,
            ts = %posted.ts,
            "sent approval request"
        );

        self.slack
            .open_view(
                &submission.trigger_id,
                &blocks::confirmation_modal(&request.approver, &request.reason),
            )
            .await
            .map_err(|source| WorkflowError::OpenView {
                view: "confirmation",
                source,
            })?;

        Ok(posted)
    }

    /// Approve/Reject pressed: tell the requester, then resolve the
    /// approver's message so its buttons disappear.
    ///
    /// There is no server-side record of the request, so a replayed press
    /// runs the whole effect again.
    pub async fn handle_decision(
        &self,
        actions: &BlockActions,
    ) -> Result<Option<DecisionOutcome>, WorkflowError> {
        let Some((action, decision)) = actions
            .actions
            .iter()
            .find_map(|a| Decision::from_action_id(&a.action_id).map(|d| (a, d)))
        else {
            tracing::debug!("block_actions without an approval action, ignoring");
            return Ok(None);
        };

        let value = action
            .value
            .as_deref()
            .ok_or(WorkflowError::MissingField("action value"))?;
        let ApprovalPayload { requester, reason } = ApprovalPayload::parse(value)?;

        // an unpressed approver message is by definition still pending
        let status = ApprovalStatus::Pending.apply(decision)?;

        tracing::info!(
            approver = %actions.user.id,
            requester = %requester,
            status = ?status,
            "resolving approval request"
        );

        self.slack
            .post_message(&requester, &blocks::requester_outcome(decision, &reason))
            .await
            .map_err(|source| WorkflowError::SendMessage {
                message: "requester outcome",
                source,
            })?;

        let channel = actions
            .channel
            .as_ref()
            .ok_or(WorkflowError::MissingField("channel"))?;
        let message = actions
            .message
            .as_ref()
            .ok_or(WorkflowError::MissingField("message"))?;

        self.slack
            .update_message(
                &channel.id,
                &message.ts,
                &blocks::resolved_request(decision, &requester, &reason),
            )
            .await
            .map_err(WorkflowError::UpdateMessage)?;

        Ok(Some(DecisionOutcome { status, requester }))
    }
}
