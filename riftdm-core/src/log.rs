//! Quest log storage.
//!
//! The engine reads and appends through the [`QuestLog`] trait so session
//! logic stays independent of where entries live. [`FileQuestLog`] is the
//! shipping implementation: an append-only file holding one JSON-encoded
//! string per line, which keeps multi-line entries on a single record
//! boundary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Errors from reading or writing the quest log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log entry encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only store of persisted quest entries.
#[async_trait]
pub trait QuestLog: Send + Sync {
    /// Up to `limit` of the most recent entries, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<String>, LogError>;

    /// Append one entry.
    async fn append(&self, entry: &str) -> Result<(), LogError>;
}

/// File-backed quest log.
///
/// Lines that fail to decode are skipped on read, so a corrupt record
/// degrades the same way a malformed entry does during replay.
#[derive(Debug, Clone)]
pub struct FileQuestLog {
    path: PathBuf,
}

impl FileQuestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestLog for FileQuestLog {
    async fn recent(&self, limit: usize) -> Result<Vec<String>, LogError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            // A log that does not exist yet is an empty log.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<String>(line) {
                Ok(entry) => entries.push(entry),
                // One corrupt line must not block every future read.
                Err(err) => warn!(%err, "skipping undecodable quest log line"),
            }
        }

        let start = entries.len().saturating_sub(limit);
        Ok(entries.split_off(start))
    }

    async fn append(&self, entry: &str) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_then_recent() {
        let dir = TempDir::new().unwrap();
        let log = FileQuestLog::new(dir.path().join("quest.log"));

        log.append("first").await.unwrap();
        log.append("second").await.unwrap();
        log.append("third").await.unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_recent_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = FileQuestLog::new(dir.path().join("never-written.log"));

        let entries = log.recent(50).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_recent_keeps_latest_in_oldest_first_order() {
        let dir = TempDir::new().unwrap();
        let log = FileQuestLog::new(dir.path().join("quest.log"));

        for n in 1..=5 {
            log.append(&format!("entry {n}")).await.unwrap();
        }

        let entries = log.recent(2).await.unwrap();
        assert_eq!(entries, vec!["entry 4", "entry 5"]);
    }

    #[tokio::test]
    async fn test_multiline_entry_stays_one_record() {
        let dir = TempDir::new().unwrap();
        let log = FileQuestLog::new(dir.path().join("quest.log"));

        let entry = "Quest ID: #1\nTimestamp: x\nPrompt:** hail (Roll: 2)\n**DM Reply:** well met";
        log.append(entry).await.unwrap();
        log.append("after").await.unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry);
    }

    #[tokio::test]
    async fn test_recent_skips_undecodable_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quest.log");
        let log = FileQuestLog::new(&path);

        log.append("first").await.unwrap();
        // Corrupt one record's framing on disk.
        let mut raw = fs::read_to_string(&path).await.unwrap();
        raw.push_str("not json\n");
        fs::write(&path, &raw).await.unwrap();
        log.append("second").await.unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_append_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let log = FileQuestLog::new(dir.path().join("logs").join("quest.log"));

        log.append("hello").await.unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries, vec!["hello"]);
    }
}
