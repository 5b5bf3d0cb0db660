//! Block Kit layouts for the approval flow's modals and messages.

use serde_json::{json, Value};

use crate::models::approval::{ApprovalRequest, Decision};
use crate::models::directory::ApproverOption;
use crate::models::interaction::{
    APPROVER_ACTION_ID, APPROVER_BLOCK_ID, CONFIRMATION_MODAL_CALLBACK_ID, REASON_ACTION_ID,
    REASON_BLOCK_ID, REQUEST_MODAL_CALLBACK_ID,
};
use crate::notification::slack::SlackMessage;

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn header(text: &str) -> Value {
    json!({
        "type": "header",
        "text": { "type": "plain_text", "text": text, "emoji": true },
    })
}

fn section(mrkdwn: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": mrkdwn },
    })
}

fn status_field(outcome: Decision) -> Value {
    json!({
        "type": "section",
        "fields": [{ "type": "mrkdwn", "text": format!("*Status:*\n{}", outcome.label()) }],
    })
}

fn description(reason: &str) -> Value {
    section(&format!("*Description:*\n{}", reason))
}

/// Modal asking the requester for an approver and a reason.
pub fn request_modal(options: &[ApproverOption]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|o| json!({ "text": plain_text(&o.label), "value": o.user_id }))
        .collect();

    json!({
        "type": "modal",
        "callback_id": REQUEST_MODAL_CALLBACK_ID,
        "title": plain_text("Request Approval"),
        "submit": plain_text("Submit"),
        "blocks": [
            {
                "type": "input",
                "block_id": APPROVER_BLOCK_ID,
                "label": plain_text("Select Approver"),
                "element": {
                    "type": "static_select",
                    "action_id": APPROVER_ACTION_ID,
                    "options": options,
                },
            },
            {
                "type": "input",
                "block_id": REASON_BLOCK_ID,
                "label": plain_text("Approval Reason"),
                "element": {
                    "type": "plain_text_input",
                    "action_id": REASON_ACTION_ID,
                    "multiline": true,
                },
            },
        ],
    })
}

/// Modal telling the requester their request went out.
pub fn confirmation_modal(approver: &str, reason: &str) -> Value {
    json!({
        "type": "modal",
        "callback_id": CONFIRMATION_MODAL_CALLBACK_ID,
        "title": plain_text("Approval Request Sent"),
        "close": plain_text("Close"),
        "blocks": [section(&format!(
            "✅ Your approval request has been successfully submitted to <@{}>.\n\n*Reason:* {}",
            approver, reason
        ))],
    })
}

/// DM to the approver. `payload` is the encoded button value.
pub fn approver_notification(request: &ApprovalRequest, payload: &str) -> SlackMessage {
    SlackMessage {
        text: format!(
            ":memo: You have a new approval request from <@{}>.",
            request.requester
        ),
        blocks: vec![
            header("🔔 Approval Request"),
            section(&format!(
                "*Requester:* <@{}>\n*Reason:*\n>{}",
                request.requester, request.reason
            )),
            json!({
                "type": "actions",
                "elements": [
                    {
                        "type": "button",
                        "text": plain_text("Approve"),
                        "style": "primary",
                        "action_id": Decision::Approve.action_id(),
                        "value": payload,
                    },
                    {
                        "type": "button",
                        "text": plain_text("Reject"),
                        "style": "danger",
                        "action_id": Decision::Reject.action_id(),
                        "value": payload,
                    },
                ],
            }),
        ],
    }
}

struct Wording {
    emoji: &'static str,
    past_tense: &'static str,
    requester_headline: &'static str,
    summary_intro: &'static str,
}

fn wording(outcome: Decision) -> Wording {
    match outcome {
        Decision::Approve => Wording {
            emoji: "✅",
            past_tense: "approved",
            requester_headline:
                "🎉 *Great news!* One of your approval requests has been *approved!* ",
            summary_intro: "👋 Here is a summary of your approval request:",
        },
        Decision::Reject => Wording {
            emoji: "❌",
            past_tense: "rejected",
            requester_headline: "*Unfortunately*, your approval request was *rejected.*",
            summary_intro: "👋 Here is a summary of your request:",
        },
    }
}

/// Terminal DM to the requester announcing the outcome.
pub fn requester_outcome(outcome: Decision, reason: &str) -> SlackMessage {
    let w = wording(outcome);
    SlackMessage {
        text: format!("{} Your approval request was {}", w.emoji, w.past_tense),
        blocks: vec![
            header(&format!("{} {}", w.emoji, outcome.label())),
            section(w.requester_headline),
            json!({ "type": "divider" }),
            section(w.summary_intro),
            status_field(outcome),
            description(reason),
        ],
    }
}

/// Replacement for the approver's original message. Carries no actions.
pub fn resolved_request(outcome: Decision, requester: &str, reason: &str) -> SlackMessage {
    let w = wording(outcome);
    let title = format!("{} Request {}", w.emoji, outcome.label());
    SlackMessage {
        text: title.clone(),
        blocks: vec![
            header(&title),
            section(&format!(
                "You have *{}* the request from <@{}>.",
                w.past_tense, requester
            )),
            status_field(outcome),
            description(reason),
        ],
    }
}
