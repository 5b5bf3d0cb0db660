use serde::Deserialize;

/// Slackbot's user id. It shows up in `users.list` as a human account.
pub const SLACKBOT_USER_ID: &str = "USLACKBOT";

/// Slack rejects a `static_select` with more options than this.
pub const MAX_SELECT_OPTIONS: usize = 100;

/// One workspace member as the bot sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: String,
    pub display_name: String,
    pub is_bot: bool,
}

/// Raw `members[]` element of a `users.list` response.
#[derive(Debug, Deserialize)]
pub struct SlackMember {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl From<SlackMember> for DirectoryEntry {
    fn from(m: SlackMember) -> Self {
        let display_name = match m.real_name {
            Some(real) if !real.is_empty() => real,
            _ => m.name,
        };
        Self {
            id: m.id,
            display_name,
            is_bot: m.is_bot,
        }
    }
}

/// A selectable approver: label shown in the dropdown, id sent back on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproverOption {
    pub label: String,
    pub user_id: String,
}

/// Everyone the requester may ask, in directory order.
///
/// Drops the requester, bot accounts and Slackbot.
pub fn eligible_approvers(entries: &[DirectoryEntry], requester: &str) -> Vec<ApproverOption> {
    entries
        .iter()
        .filter(|e| !e.is_bot && e.id != requester && e.id != SLACKBOT_USER_ID)
        .map(|e| ApproverOption {
            label: e.display_name.clone(),
            user_id: e.id.clone(),
        })
        .collect()
}
