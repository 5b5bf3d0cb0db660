//! Inbound Slack payloads: slash commands and interactivity callbacks.
//!
//! Only the fields the approval flow reads are modelled; everything else in
//! Slack's payloads is ignored by serde.

use std::collections::HashMap;

use serde::Deserialize;

pub const REQUEST_MODAL_CALLBACK_ID: &str = "approval_modal";
pub const CONFIRMATION_MODAL_CALLBACK_ID: &str = "confirmation_modal";

pub const APPROVER_BLOCK_ID: &str = "approver_block";
pub const APPROVER_ACTION_ID: &str = "approver";
pub const REASON_BLOCK_ID: &str = "text_block";
pub const REASON_ACTION_ID: &str = "approval_text";

/// Form body Slack posts to the slash command URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub text: String,
    /// Set on Slack's periodic certificate probes; carries no command.
    #[serde(default)]
    pub ssl_check: Option<String>,
}

impl SlashCommand {
    pub fn is_ssl_check(&self) -> bool {
        self.ssl_check.as_deref() == Some("1")
    }
}

/// Interactivity requests arrive form-encoded with a single `payload` field.
#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    ViewSubmission(ViewSubmission),
    BlockActions(BlockActions),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewSubmission {
    pub user: UserRef,
    #[serde(default)]
    pub trigger_id: String,
    pub view: SubmittedView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedView {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub state: ViewState,
}

/// `view.state.values`, keyed by block id then action id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ElementState>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementState {
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl ViewState {
    fn element(&self, block_id: &str, action_id: &str) -> Option<&ElementState> {
        self.values.get(block_id)?.get(action_id)
    }
}

impl ViewSubmission {
    /// User id picked in the approver dropdown.
    pub fn approver(&self) -> Option<&str> {
        self.view
            .state
            .element(APPROVER_BLOCK_ID, APPROVER_ACTION_ID)?
            .selected_option
            .as_ref()
            .map(|o| o.value.as_str())
    }

    pub fn reason(&self) -> Option<&str> {
        self.view
            .state
            .element(REASON_BLOCK_ID, REASON_ACTION_ID)?
            .value
            .as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockActions {
    pub user: UserRef,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    #[serde(default)]
    pub message: Option<MessageRef>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub ts: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}
