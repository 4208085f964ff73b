//! Cross-run history store
//!
//! Durable dedup and download tracking, opt-in via
//! [`HistoryConfig`](crate::config::HistoryConfig). Two files per directory:
//! `tiktok_history.json` maps a target key (`{kind}_{input}`, or `trend`) to
//! its [`HistoryRecord`], and one sibling file per target key holds the flat
//! JSON array of previously processed post ids. Both are fully rewritten at
//! session end, never appended.
//!
//! Read failures (missing or unparsable files) are treated as an empty
//! store. Write failures are logged and swallowed: the in-memory session
//! result is still valid for this run.

use crate::error::ScrapeError;
use crate::types::{HistoryRecord, Post, ScrapeKind};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// File name of the history index within the history directory
pub const HISTORY_INDEX_FILE: &str = "tiktok_history.json";

/// Handle on one history directory
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Create a store over `dir`. The directory is expected to exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the history index file
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(HISTORY_INDEX_FILE)
    }

    /// Path of the id-store file for one target key
    pub fn id_store_path(&self, store_value: &str) -> PathBuf {
        self.dir.join(format!("{store_value}.json"))
    }

    /// The index key for one target: `trend` for the trending feed,
    /// `{kind}_{input}` otherwise
    pub fn target_key(kind: ScrapeKind, input: &str) -> String {
        if kind == ScrapeKind::Trend {
            "trend".to_string()
        } else {
            format!("{kind}_{input}")
        }
    }

    /// Merge the session's collected posts against durable history.
    ///
    /// Partitions `posts` into new (id absent from the id store) and already
    /// seen (id present); already-seen posts are dropped from the returned
    /// sequence. New ids are appended to the store, the index record's
    /// `downloaded_posts` grows by the new count, and both files are
    /// rewritten.
    pub async fn apply(
        &self,
        kind: ScrapeKind,
        input: &str,
        store_value: &str,
        posts: Vec<Post>,
    ) -> Vec<Post> {
        let id_path = self.id_store_path(store_value);
        let mut known_ids = self.load_id_store(&id_path).await;
        // Set for membership, Vec for ordered persistence
        let mut known: HashSet<String> = known_ids.iter().cloned().collect();

        let before = known_ids.len();
        let mut kept = Vec::with_capacity(posts.len());
        for post in posts {
            if known.contains(&post.id) {
                tracing::debug!(id = %post.id, "dropping post already present in history");
            } else {
                known.insert(post.id.clone());
                known_ids.push(post.id.clone());
                kept.push(post);
            }
        }

        let mut index = self.load_index().await;
        let key = Self::target_key(kind, input);
        let prior = index.get(&key).map(|r| r.downloaded_posts).unwrap_or(0);
        index.insert(
            key.clone(),
            HistoryRecord {
                kind,
                input: input.to_string(),
                downloaded_posts: prior + kept.len() as u64,
                last_change: Utc::now(),
                file_location: id_path.clone(),
            },
        );

        tracing::info!(
            target_key = %key,
            new = kept.len(),
            known = before,
            "history merged"
        );

        if let Err(error) = self.persist(&id_path, &known_ids).await {
            tracing::warn!(error = %error, "history not persisted; session result unaffected");
        }
        if let Err(error) = self.persist(&self.index_path(), &index).await {
            tracing::warn!(error = %error, "history not persisted; session result unaffected");
        }

        kept
    }

    /// Load the id store; missing or unparsable files count as empty
    async fn load_id_store(&self, path: &Path) -> Vec<String> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Load the history index; missing or unparsable files count as empty
    async fn load_index(&self) -> HashMap<String, HistoryRecord> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => HashMap::new(),
        }
    }

    /// Rewrite one history file
    async fn persist<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), ScrapeError> {
        let persistence = |reason: String| ScrapeError::Persistence {
            path: path.to_path_buf(),
            reason,
        };
        let bytes = serde_json::to_vec(value).map_err(|e| persistence(e.to_string()))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| persistence(e.to_string()))
    }
}
