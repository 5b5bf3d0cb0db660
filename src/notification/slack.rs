use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::cache::DirectorySource;
use crate::models::directory::{DirectoryEntry, SlackMember};

/// Page size requested from `users.list`. Slack recommends at most 200.
const USERS_PAGE_LIMIT: &str = "200";

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("slack returned error: status={status}, body={body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("slack {method} failed: {error}")]
    Api { method: &'static str, error: String },

    #[error("unexpected slack {method} response: {source}")]
    Decode {
        method: &'static str,
        source: serde_json::Error,
    },
}

/// Message body for `chat.postMessage` / `chat.update`.
/// `text` is the notification fallback; `blocks` is what users see.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlackMessage {
    pub text: String,
    pub blocks: Vec<Value>,
}

/// Where a posted message landed; the pair keys any later `chat.update`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// The outbound Slack calls the approval workflow makes.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `views.open`: show a modal in response to a trigger.
    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError>;

    /// `chat.postMessage`. A user id as `channel` posts to that user's DM.
    async fn post_message(
        &self,
        channel: &str,
        message: &SlackMessage,
    ) -> Result<PostedMessage, SlackError>;

    /// `chat.update`: replace a message's text and blocks in place.
    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), SlackError>;
}

/// Slack Web API client authenticated with the bot token.
#[derive(Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    token: Zeroizing<String>,
}

#[derive(Deserialize)]
struct UsersPage {
    #[serde(default)]
    members: Vec<SlackMember>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

impl SlackClient {
    pub fn new(base_url: &str, token: Zeroizing<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("approval-bot/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// POST a JSON body to a Web API method and unwrap Slack's `ok` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &Value,
    ) -> Result<T, SlackError> {
        let resp = self
            .client
            .post(self.url(method))
            .bearer_auth(self.token.as_str())
            .json(body)
            .send()
            .await?;
        self.unwrap_envelope(method, resp).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        &self,
        method: &'static str,
        resp: reqwest::Response,
    ) -> Result<T, SlackError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SlackError::Status { status, body });
        }

        let json: Value = resp.json().await?;
        if !json.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let error = json
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            return Err(SlackError::Api { method, error });
        }

        serde_json::from_value(json).map_err(|source| SlackError::Decode { method, source })
    }

    /// Fetch every workspace member, following `next_cursor` to the end.
    pub async fn list_users(&self) -> Result<Vec<DirectoryEntry>, SlackError> {
        let mut entries = Vec::new();
        let mut cursor = String::new();
        let mut pages = 0usize;

        loop {
            let mut req = self
                .client
                .get(self.url("users.list"))
                .bearer_auth(self.token.as_str())
                .query(&[("limit", USERS_PAGE_LIMIT)]);
            if !cursor.is_empty() {
                req = req.query(&[("cursor", cursor.as_str())]);
            }

            let resp = req.send().await?;
            let page: UsersPage = self.unwrap_envelope("users.list", resp).await?;
            pages += 1;

            entries.extend(page.members.into_iter().map(DirectoryEntry::from));

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        tracing::debug!(members = entries.len(), pages, "fetched slack user list");
        Ok(entries)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError> {
        let body = serde_json::json!({ "trigger_id": trigger_id, "view": view });
        let _: Value = self.call("views.open", &body).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &SlackMessage,
    ) -> Result<PostedMessage, SlackError> {
        let body = serde_json::json!({
            "channel": channel,
            "text": message.text,
            "blocks": message.blocks,
        });
        self.call("chat.postMessage", &body).await
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), SlackError> {
        let body = serde_json::json!({
            "channel": channel,
            "ts": ts,
            "text": message.text,
            "blocks": message.blocks,
        });
        let _: Value = self.call("chat.update", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectorySource for SlackClient {
    async fn fetch_directory(&self) -> Result<Vec<DirectoryEntry>, SlackError> {
        self.list_users().await
    }
}
