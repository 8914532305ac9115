//! Conversation memory reconstructed from the quest log.
//!
//! Each completed exchange is persisted as a marker-delimited text entry.
//! Replay scans up to [`MEMORY_WINDOW`] entries oldest-first, parses each
//! into a structured [`QuestRecord`], and rebuilds the transcript handed to
//! the narrator along with the next quest number. Numbering is derived from
//! observed history rather than a stored counter, so it self-heals if
//! entries are lost but never decreases.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Maximum number of log entries replayed into context.
pub const MEMORY_WINDOW: usize = 50;

/// Timestamp format written into persisted entries.
pub const TIMESTAMP_FORMAT: &str = "%B %d, %Y – %I:%M %p";

const QUEST_ID_MARKER: &str = "Quest ID: #";
const TIMESTAMP_MARKER: &str = "Timestamp: ";
const PROMPT_MARKER: &str = "Prompt:** ";
const REPLY_MARKER: &str = "**DM Reply:**";
const REPLY_LINE_MARKER: &str = "\n**DM Reply:**";
const REPLY_TEXT_MARKER: &str = "**DM Reply:** ";

/// One persisted narrative exchange.
///
/// `prompt` stores the full user line as persisted, including the
/// ` (Roll: N)` suffix, so replay reproduces exactly what the narrator
/// previously saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub quest_id: u64,
    pub timestamp: String,
    pub prompt: String,
    pub reply: String,
}

impl QuestRecord {
    /// Build a record for a completed exchange, composing the stored
    /// prompt line from the raw prompt and the roll shown to the player.
    pub fn new(
        quest_id: u64,
        timestamp: impl Into<String>,
        prompt: &str,
        roll: i32,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            quest_id,
            timestamp: timestamp.into(),
            prompt: format!("{prompt} (Roll: {roll})"),
            reply: reply.into(),
        }
    }

    /// Render the record in the persisted wire format.
    pub fn to_log_string(&self) -> String {
        format!(
            "Quest ID: #{}\nTimestamp: {}\nPrompt:** {}\n**DM Reply:** {}",
            self.quest_id, self.timestamp, self.prompt, self.reply
        )
    }

    /// Parse a persisted entry.
    ///
    /// Entries without the reply marker are irrelevant (other channel
    /// traffic, not quest records); entries with the marker that fail a
    /// later field are malformed. Either way the caller skips them.
    pub fn parse(entry: &str) -> Result<Self, EntrySkip> {
        if !entry.contains(REPLY_MARKER) {
            return Err(EntrySkip::Irrelevant);
        }

        let after_id = entry
            .split(QUEST_ID_MARKER)
            .nth(1)
            .ok_or(EntrySkip::MissingQuestId)?;
        let id_segment = after_id.split('\n').next().unwrap_or_default();
        let quest_id: u64 = id_segment
            .trim()
            .parse()
            .map_err(|_| EntrySkip::InvalidQuestNumber)?;

        let after_prompt = entry
            .split(PROMPT_MARKER)
            .nth(1)
            .ok_or(EntrySkip::MissingPrompt)?;
        let prompt = match after_prompt.find(REPLY_LINE_MARKER) {
            Some(pos) => &after_prompt[..pos],
            None => after_prompt,
        };

        let reply = entry
            .split(REPLY_TEXT_MARKER)
            .nth(1)
            .ok_or(EntrySkip::MissingReply)?;

        let timestamp = entry
            .split(TIMESTAMP_MARKER)
            .nth(1)
            .and_then(|rest| rest.split('\n').next())
            .unwrap_or_default();

        Ok(Self {
            quest_id,
            timestamp: timestamp.to_string(),
            prompt: prompt.to_string(),
            reply: reply.to_string(),
        })
    }
}

/// Reason an entry was skipped during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EntrySkip {
    /// Not a quest record at all; not counted as malformed.
    #[error("not a quest record")]
    Irrelevant,
    #[error("quest id marker missing")]
    MissingQuestId,
    #[error("quest number is not an integer")]
    InvalidQuestNumber,
    #[error("prompt marker missing")]
    MissingPrompt,
    #[error("reply marker missing")]
    MissingReply,
}

impl EntrySkip {
    /// Malformed records carry the reply marker but fail a later field.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, EntrySkip::Irrelevant)
    }
}

/// Role of one reconstructed transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

/// One (role, text) pair of the reconstructed transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Bounded reconstruction of prior exchanges, recomputed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWindow {
    /// Transcript in scan order: a user turn then an assistant turn per
    /// parsed record.
    pub turns: Vec<Turn>,
    /// Quest number to assign to the next exchange.
    pub next_quest_id: u64,
    /// Entries the scan could not use, and why.
    pub skipped: Vec<SkippedEntry>,
}

impl ConversationWindow {
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of complete exchanges in the transcript.
    pub fn exchange_count(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn malformed_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| s.reason.is_malformed())
            .count()
    }
}

/// An entry the replay scan skipped, by position in the scanned slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: EntrySkip,
}

/// Replay log entries, oldest first, into a conversation window.
///
/// Each parsed record contributes a user turn followed by an assistant
/// turn. The next quest id is one past the highest id seen, or 1 when
/// nothing parses. A record either parses completely or contributes
/// nothing; a single bad entry never aborts the scan.
pub fn replay<S: AsRef<str>>(entries: &[S]) -> ConversationWindow {
    let mut turns = Vec::new();
    let mut skipped = Vec::new();
    let mut max_seen: Option<u64> = None;

    for (index, entry) in entries.iter().enumerate() {
        match QuestRecord::parse(entry.as_ref()) {
            Ok(record) => {
                max_seen = Some(max_seen.map_or(record.quest_id, |m| m.max(record.quest_id)));
                turns.push(Turn::user(&record.prompt));
                turns.push(Turn::assistant(&record.reply));
            }
            Err(reason) => {
                debug!(index, %reason, "skipped log entry during replay");
                skipped.push(SkippedEntry { index, reason });
            }
        }
    }

    ConversationWindow {
        turns,
        next_quest_id: max_seen.map_or(1, |m| m.saturating_add(1)),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(quest_id: u64, prompt: &str, roll: i32, reply: &str) -> String {
        QuestRecord::new(quest_id, "August 12, 2025 – 07:30 PM", prompt, roll, reply)
            .to_log_string()
    }

    #[test]
    fn test_log_string_format() {
        let record = QuestRecord::new(3, "August 12, 2025 – 07:30 PM", "I sneak in", 9, "You slip past.");
        assert_eq!(
            record.to_log_string(),
            "Quest ID: #3\n\
             Timestamp: August 12, 2025 – 07:30 PM\n\
             Prompt:** I sneak in (Roll: 9)\n\
             **DM Reply:** You slip past."
        );
    }

    #[test]
    fn test_record_round_trip() {
        let record = QuestRecord::new(3, "August 12, 2025 – 07:30 PM", "I sneak in", 9, "You slip past.");
        let parsed = QuestRecord::parse(&record.to_log_string()).unwrap();

        assert_eq!(parsed, record);
        assert_eq!(parsed.prompt, "I sneak in (Roll: 9)");
    }

    #[test]
    fn test_parse_without_reply_marker_is_irrelevant() {
        let result = QuestRecord::parse("two goblins walk into a tavern");
        assert_eq!(result.unwrap_err(), EntrySkip::Irrelevant);
        assert!(!EntrySkip::Irrelevant.is_malformed());
    }

    #[test]
    fn test_parse_missing_quest_id() {
        let result = QuestRecord::parse("Prompt:** hello\n**DM Reply:** well met");
        assert_eq!(result.unwrap_err(), EntrySkip::MissingQuestId);
    }

    #[test]
    fn test_parse_invalid_quest_number() {
        let result =
            QuestRecord::parse("Quest ID: #nine\nPrompt:** hello\n**DM Reply:** well met");
        assert_eq!(result.unwrap_err(), EntrySkip::InvalidQuestNumber);
        assert!(EntrySkip::InvalidQuestNumber.is_malformed());
    }

    #[test]
    fn test_parse_negative_quest_number_is_invalid() {
        let result = QuestRecord::parse("Quest ID: #-2\nPrompt:** hello\n**DM Reply:** well met");
        assert_eq!(result.unwrap_err(), EntrySkip::InvalidQuestNumber);
    }

    #[test]
    fn test_parse_missing_prompt() {
        let result = QuestRecord::parse("Quest ID: #4\n**DM Reply:** well met");
        assert_eq!(result.unwrap_err(), EntrySkip::MissingPrompt);
    }

    #[test]
    fn test_parse_reply_marker_without_text() {
        // Marker present but no trailing space means the reply text
        // segment is missing.
        let result = QuestRecord::parse("Quest ID: #4\nPrompt:** hello\n**DM Reply:**");
        assert_eq!(result.unwrap_err(), EntrySkip::MissingReply);
    }

    #[test]
    fn test_parse_tolerates_missing_timestamp() {
        let parsed =
            QuestRecord::parse("Quest ID: #4\nPrompt:** hello\n**DM Reply:** well met").unwrap();
        assert_eq!(parsed.quest_id, 4);
        assert_eq!(parsed.timestamp, "");
    }

    #[test]
    fn test_replay_empty_log() {
        let window = replay::<String>(&[]);
        assert!(window.is_empty());
        assert_eq!(window.next_quest_id, 1);
        assert!(window.skipped.is_empty());
    }

    #[test]
    fn test_replay_skips_malformed_and_numbers_from_max() {
        let entries = vec![
            entry(1, "I enter the crypt", 7, "The door groans open."),
            entry(2, "I light a torch", 5, "Shadows scatter."),
            "Quest ID: #oops\nPrompt:** broken\n**DM Reply:** entry".to_string(),
            entry(3, "I descend", 11, "The stair spirals down."),
        ];

        let window = replay(&entries);

        assert_eq!(window.turns.len(), 6);
        assert_eq!(window.exchange_count(), 3);
        assert_eq!(window.next_quest_id, 4);
        assert_eq!(
            window.skipped,
            vec![SkippedEntry {
                index: 2,
                reason: EntrySkip::InvalidQuestNumber
            }]
        );
        assert_eq!(window.malformed_count(), 1);
    }

    #[test]
    fn test_replay_transcript_order() {
        let entries = vec![entry(1, "I knock", 4, "No answer.")];
        let window = replay(&entries);

        assert_eq!(
            window.turns,
            vec![
                Turn::user("I knock (Roll: 4)"),
                Turn::assistant("No answer."),
            ]
        );
    }

    #[test]
    fn test_replay_nothing_parses() {
        let entries = vec!["chatter".to_string(), "more chatter".to_string()];
        let window = replay(&entries);

        assert!(window.is_empty());
        assert_eq!(window.next_quest_id, 1);
        assert_eq!(window.skipped.len(), 2);
        assert_eq!(window.malformed_count(), 0);
    }

    #[test]
    fn test_replay_numbers_from_max_not_last() {
        let entries = vec![
            entry(7, "I shout", 3, "Echoes."),
            entry(3, "I listen", 8, "Silence."),
        ];
        let window = replay(&entries);
        assert_eq!(window.next_quest_id, 8);
    }

    #[test]
    fn test_replay_quest_zero_keeps_floor() {
        let entries = vec![entry(0, "I wait", 2, "Time passes.")];
        let window = replay(&entries);

        assert_eq!(window.turns.len(), 2);
        assert_eq!(window.next_quest_id, 1);
    }
}
