//! Testing utilities for narrative sessions.
//!
//! This module provides tools for integration testing:
//! - `ScriptedNarrator` for deterministic replies without API calls
//! - `MemoryQuestLog` for quest history without a filesystem
//! - `TestSession` for wiring both into a session engine
//! - Assertion helpers for verifying quest history

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::log::{LogError, QuestLog};
use crate::memory::QuestRecord;
use crate::narrator::{NarrateError, NarrationRequest, Narrator};
use crate::session::{SessionConfig, SessionEngine};

/// A narrator that returns scripted replies.
///
/// Use this for deterministic tests without API calls. Clones share the
/// same script and captured requests, so tests keep a handle after moving
/// one into an engine.
#[derive(Clone, Default)]
pub struct ScriptedNarrator {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<NarrationRequest>>>,
}

impl ScriptedNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply to return in order.
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failure to return in order.
    pub fn queue_failure(&self, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(message.into()));
    }

    /// Every request this narrator has received, in order.
    pub fn requests(&self) -> Vec<NarrationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(&self, request: NarrationRequest) -> Result<String, NarrateError> {
        self.requests.lock().unwrap().push(request);

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(NarrateError::Backend(openrouter::Error::Network(message))),
            None => Ok("The narrator has no more scripted replies.".to_string()),
        }
    }
}

/// A quest log held entirely in memory.
///
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryQuestLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemoryQuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestLog for MemoryQuestLog {
    async fn recent(&self, limit: usize) -> Result<Vec<String>, LogError> {
        let entries = self.entries.lock().unwrap();
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }

    async fn append(&self, entry: &str) -> Result<(), LogError> {
        self.entries.lock().unwrap().push(entry.to_string());
        Ok(())
    }
}

/// Test harness bundling a session engine with scripted narration and an
/// in-memory quest log.
pub struct TestSession {
    pub narrator: ScriptedNarrator,
    pub log: MemoryQuestLog,
    pub engine: SessionEngine<ScriptedNarrator, MemoryQuestLog>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let narrator = ScriptedNarrator::new();
        let log = MemoryQuestLog::new();
        let engine = SessionEngine::new(config, narrator.clone(), log.clone());

        Self {
            narrator,
            log,
            engine,
        }
    }

    /// Queue a narrative reply.
    pub fn expect_narrative(&self, text: impl Into<String>) -> &Self {
        self.narrator.queue_reply(text);
        self
    }

    /// Queue a narration failure.
    pub fn expect_failure(&self, message: impl Into<String>) -> &Self {
        self.narrator.queue_failure(message);
        self
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the log holds exactly `expected` entries.
#[track_caller]
pub fn assert_quest_count(log: &MemoryQuestLog, expected: usize) {
    let actual = log.entries().len();
    assert_eq!(
        actual, expected,
        "Expected {expected} logged quests, got {actual}"
    );
}

/// Assert the most recent logged entry carries the given quest id.
#[track_caller]
pub fn assert_last_quest_id(log: &MemoryQuestLog, expected: u64) {
    let entries = log.entries();
    let last = entries
        .last()
        .unwrap_or_else(|| panic!("Expected a logged quest, log is empty"));
    let record = QuestRecord::parse(last)
        .unwrap_or_else(|reason| panic!("Last log entry did not parse: {reason}"));
    assert_eq!(
        record.quest_id, expected,
        "Expected last quest id {expected}, got {}",
        record.quest_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PlayerId;

    #[tokio::test]
    async fn test_scripted_narrator_replays_in_order() {
        let narrator = ScriptedNarrator::new();
        narrator.queue_reply("first");
        narrator.queue_reply("second");

        let request = NarrationRequest::new(Vec::new(), "act");
        assert_eq!(narrator.narrate(request.clone()).await.unwrap(), "first");
        assert_eq!(narrator.narrate(request.clone()).await.unwrap(), "second");

        // Exhausted scripts fall back to a default reply.
        let reply = narrator.narrate(request).await.unwrap();
        assert!(reply.contains("no more scripted"));
        assert_eq!(narrator.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_log_recent_honors_limit() {
        let log = MemoryQuestLog::new();
        for n in 1..=4 {
            log.append(&format!("entry {n}")).await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent, vec!["entry 3", "entry 4"]);
    }

    #[tokio::test]
    async fn test_session_harness_round_trip() {
        let session = TestSession::new();
        session.expect_narrative("You stand in a dusty tavern.");

        let player = PlayerId::new("p1");
        let response = session
            .engine
            .handle_narrative_request(&player, "I look around")
            .await
            .unwrap();

        assert_eq!(response.narrative, "You stand in a dusty tavern.");
        assert_quest_count(&session.log, 1);
        assert_last_quest_id(&session.log, 1);
    }
}
