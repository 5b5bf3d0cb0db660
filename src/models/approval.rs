use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action id of the "Approve" button attached to an approver notification.
pub const APPROVE_ACTION_ID: &str = "approve_request";
/// Action id of the "Reject" button attached to an approver notification.
pub const REJECT_ACTION_ID: &str = "reject_request";

/// Slack caps a button `value` at 2000 characters.
pub const MAX_BUTTON_VALUE_LEN: usize = 2000;

/// A request travelling from requester to approver.
///
/// Never persisted: `(requester, reason)` rides along in the button payload
/// of the approver's notification and is parsed back out when a button is
/// pressed. The approver is implied by whoever received the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub requester: String,
    pub approver: String,
    pub reason: String,
}

impl ApprovalRequest {
    pub fn new(
        requester: impl Into<String>,
        approver: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            requester: requester.into(),
            approver: approver.into(),
            reason: reason.into(),
        }
    }

    /// The part of the request that is embedded in the button payload.
    pub fn payload(&self) -> ApprovalPayload {
        ApprovalPayload {
            requester: self.requester.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Wire shape of the button value: `{"requester": "...", "reason": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    pub requester: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed approval payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("approval payload is {len} chars, slack allows {max}")]
    TooLarge { len: usize, max: usize },
}

impl ApprovalPayload {
    /// Serialize into a button value, refusing anything Slack would reject.
    pub fn encode(&self) -> Result<String, PayloadError> {
        let value = serde_json::to_string(self)?;
        let len = value.chars().count();
        if len > MAX_BUTTON_VALUE_LEN {
            return Err(PayloadError::TooLarge {
                len,
                max: MAX_BUTTON_VALUE_LEN,
            });
        }
        Ok(value)
    }

    pub fn parse(value: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(value)?)
    }
}

// ── State machine ────────────────────────────────────────────

/// Lifecycle of a request. `Pending` is never stored anywhere: it is the
/// state of an approver message whose buttons have not been pressed yet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Which button the approver pressed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("request already {0:?}")]
    AlreadyResolved(ApprovalStatus),
}

impl Decision {
    /// Map a Slack action id to a decision. Unknown ids are not ours.
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        match action_id {
            APPROVE_ACTION_ID => Some(Decision::Approve),
            REJECT_ACTION_ID => Some(Decision::Reject),
            _ => None,
        }
    }

    pub fn action_id(self) -> &'static str {
        match self {
            Decision::Approve => APPROVE_ACTION_ID,
            Decision::Reject => REJECT_ACTION_ID,
        }
    }

    /// Capitalised outcome used in message headers and status fields.
    pub fn label(self) -> &'static str {
        match self {
            Decision::Approve => "Approved",
            Decision::Reject => "Rejected",
        }
    }
}

impl ApprovalStatus {
    /// Apply a decision. Only `Pending` moves; both outcomes are terminal.
    pub fn apply(self, decision: Decision) -> Result<ApprovalStatus, TransitionError> {
        match self {
            ApprovalStatus::Pending => Ok(match decision {
                Decision::Approve => ApprovalStatus::Approved,
                Decision::Reject => ApprovalStatus::Rejected,
            }),
            resolved => Err(TransitionError::AlreadyResolved(resolved)),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

// ── Tests ─────────────────────────────────────────────────────
