//! In-process fakes for the Slack Web API and the directory source.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approvals::cache::{DirectoryCache, DirectorySource, SystemClock};
use approvals::models::directory::DirectoryEntry;
use approvals::notification::slack::{PostedMessage, SlackApi, SlackError, SlackMessage};
use approvals::workflow::ApprovalWorkflow;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OpenView {
        trigger_id: String,
        view: Value,
    },
    Post {
        channel: String,
        message: SlackMessage,
    },
    Update {
        channel: String,
        ts: String,
        message: SlackMessage,
    },
}

/// Records every outbound call; each kind can be told to fail.
#[derive(Default)]
pub struct FakeSlack {
    pub calls: Mutex<Vec<Call>>,
    pub fail_open_view: AtomicBool,
    pub fail_post: AtomicBool,
    pub fail_update: AtomicBool,
}

impl FakeSlack {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn api_error(method: &'static str) -> SlackError {
    SlackError::Api {
        method,
        error: "channel_not_found".into(),
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError> {
        if self.fail_open_view.load(Ordering::SeqCst) {
            return Err(api_error("views.open"));
        }
        self.record(Call::OpenView {
            trigger_id: trigger_id.into(),
            view: view.clone(),
        });
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        message: &SlackMessage,
    ) -> Result<PostedMessage, SlackError> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(api_error("chat.postMessage"));
        }
        self.record(Call::Post {
            channel: channel.into(),
            message: message.clone(),
        });
        Ok(PostedMessage {
            channel: format!("D_{}", channel),
            ts: "1700000000.000100".into(),
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        message: &SlackMessage,
    ) -> Result<(), SlackError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(api_error("chat.update"));
        }
        self.record(Call::Update {
            channel: channel.into(),
            ts: ts.into(),
            message: message.clone(),
        });
        Ok(())
    }
}

pub struct FakeDirectory {
    pub entries: Vec<DirectoryEntry>,
    pub fail: AtomicBool,
    pub fetches: AtomicUsize,
}

impl FakeDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            fail: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DirectorySource for FakeDirectory {
    async fn fetch_directory(&self) -> Result<Vec<DirectoryEntry>, SlackError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SlackError::Api {
                method: "users.list",
                error: "invalid_auth".into(),
            });
        }
        Ok(self.entries.clone())
    }
}

pub fn member(id: &str, name: &str, is_bot: bool) -> DirectoryEntry {
    DirectoryEntry {
        id: id.into(),
        display_name: name.into(),
        is_bot,
    }
}

/// A small workspace: the requester, two humans, a bot and Slackbot.
pub fn workspace() -> Vec<DirectoryEntry> {
    vec![
        member("USLACKBOT", "Slackbot", false),
        member("U_REQ", "Rita Requester", false),
        member("U_APP", "Andy Approver", false),
        member("B_DEPLOY", "Deploy Bot", true),
        member("U_OTHER", "Olga Other", false),
    ]
}

pub fn workflow_with(
    entries: Vec<DirectoryEntry>,
) -> (ApprovalWorkflow, Arc<FakeSlack>, Arc<FakeDirectory>) {
    let slack = Arc::new(FakeSlack::default());
    let directory = Arc::new(FakeDirectory::new(entries));
    let cache = DirectoryCache::new(directory.clone(), Arc::new(SystemClock), 300);
    (
        ApprovalWorkflow::new(slack.clone(), cache),
        slack,
        directory,
    )
}

/// `io::Write` sink shared with a tracing subscriber so tests can read logs.
#[derive(Clone, Default)]
pub struct LogBuffer(pub Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install a thread-local subscriber writing plain text into the buffer.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buf = LogBuffer::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buf, guard)
}
