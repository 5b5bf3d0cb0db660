//! In-memory snapshot of the workspace directory.
//!
//! The snapshot is refreshed lazily: a read after the freshness window has
//! elapsed triggers one full fetch, which replaces the snapshot wholesale.
//! Nothing is evicted individually.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::models::directory::DirectoryEntry;
use crate::notification::slack::SlackError;

/// Default freshness window for the directory snapshot.
pub const DEFAULT_DIRECTORY_TTL_SECS: u64 = 5 * 60;

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where the full directory comes from on a cache miss.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch_directory(&self) -> Result<Vec<DirectoryEntry>, SlackError>;
}

/// A complete directory as of `fetched_at`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub entries: Arc<Vec<DirectoryEntry>>,
    pub fetched_at: DateTime<Utc>,
}

/// Shared, cheaply-cloneable directory cache.
///
/// Two concurrent misses may both fetch; the later write wins. The lock is
/// never held across the fetch.
#[derive(Clone)]
pub struct DirectoryCache {
    snapshot: Arc<RwLock<Option<DirectorySnapshot>>>,
    source: Arc<dyn DirectorySource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl DirectoryCache {
    pub fn new(source: Arc<dyn DirectorySource>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(None)),
            source,
            clock,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Return the cached directory, refetching if it is missing or stale.
    ///
    /// A failed fetch leaves the previous snapshot and its timestamp alone,
    /// so the next call retries.
    pub async fn get_directory(&self) -> Result<DirectorySnapshot, SlackError> {
        let now = self.clock.now();

        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            if now - snapshot.fetched_at <= self.ttl {
                tracing::debug!(
                    members = snapshot.entries.len(),
                    age_secs = (now - snapshot.fetched_at).num_seconds(),
                    "using cached directory"
                );
                return Ok(snapshot.clone());
            }
        }

        tracing::info!("fetching fresh directory from slack");
        let entries = self.source.fetch_directory().await?;
        let snapshot = DirectorySnapshot {
            entries: Arc::new(entries),
            fetched_at: now,
        };
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// The current snapshot without triggering a fetch.
    pub async fn peek(&self) -> Option<DirectorySnapshot> {
        self.snapshot.read().await.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────
