//! SessionEngine - the primary public API for narrative play.
//!
//! This module wraps the character store, party tracker, memory replay,
//! dice, quest log, and narrator into a single engine. Shared state lives
//! behind async mutexes so one engine can serve concurrent callers; locks
//! are released before any network or disk I/O.

use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::character::{passive_bonus, Character, CharacterStore, PlayerId, UNNAMED_ADVENTURER};
use crate::dice::{DiceFormula, RollResult};
use crate::log::{LogError, QuestLog};
use crate::memory::{self, QuestRecord, MEMORY_WINDOW, TIMESTAMP_FORMAT};
use crate::narrator::{NarrateError, NarrationRequest, Narrator};
use crate::party::{PartyError, PartyTracker};

/// Errors from SessionEngine operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Party(#[from] PartyError),

    #[error("quest log error: {0}")]
    Log(#[from] LogError),

    #[error("narration failed: {0}")]
    Generation(#[from] NarrateError),

    #[error("narration timed out after {0:?}")]
    Timeout(Duration),
}

/// Configuration for a session engine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Dice formula rolled for every player action, before passive bonuses.
    pub action_formula: String,

    /// Maximum number of log entries replayed into context.
    pub memory_window: usize,

    /// Hard cap on one narration round trip.
    pub request_timeout: Duration,

    /// Custom narrator system prompt.
    pub system_prompt: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            action_formula: "2d6".to_string(),
            memory_window: MEMORY_WINDOW,
            request_timeout: Duration::from_secs(120),
            system_prompt: None,
        }
    }

    /// Set the dice formula rolled for player actions.
    pub fn with_action_formula(mut self, formula: impl Into<String>) -> Self {
        self.action_formula = formula.into();
        self
    }

    /// Set how many log entries are replayed into context.
    pub fn with_memory_window(mut self, window: usize) -> Self {
        self.memory_window = window;
        self
    }

    /// Set the narration timeout.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Set a custom narrator system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Response from a completed narrative exchange.
#[derive(Debug, Clone)]
pub struct QuestResponse {
    /// The action roll shown to the player.
    pub roll: RollResult,

    /// The narrator's reply.
    pub narrative: String,

    /// Sequence number assigned to this exchange.
    pub quest_id: u64,
}

/// A running narrative session.
///
/// Generic over the narrator and quest log so tests run fully offline.
/// Methods take `&self`; share the engine behind an `Arc` to serve
/// concurrent callers.
pub struct SessionEngine<N, L> {
    config: SessionConfig,
    narrator: N,
    log: L,
    characters: Mutex<CharacterStore>,
    party: Mutex<PartyTracker>,
}

impl<N: Narrator, L: QuestLog> SessionEngine<N, L> {
    pub fn new(config: SessionConfig, narrator: N, log: L) -> Self {
        Self {
            config,
            narrator,
            log,
            characters: Mutex::new(CharacterStore::new()),
            party: Mutex::new(PartyTracker::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ========================================================================
    // Characters
    // ========================================================================

    /// Create or replace the player's character sheet.
    pub async fn create_character(
        &self,
        player: PlayerId,
        name: impl Into<String>,
        race: impl Into<String>,
        class: impl Into<String>,
        personality: Option<String>,
    ) -> Character {
        self.characters
            .lock()
            .await
            .create(player, name, race, class, personality)
    }

    /// Store a fully-built sheet, replacing any existing one.
    pub async fn insert_character(&self, player: PlayerId, character: Character) {
        self.characters.lock().await.insert(player, character);
    }

    pub async fn character(&self, player: &PlayerId) -> Option<Character> {
        self.characters.lock().await.get(player).cloned()
    }

    /// Remove the player's sheet. Returns whether one existed.
    pub async fn delete_character(&self, player: &PlayerId) -> bool {
        self.characters.lock().await.delete(player)
    }

    // ========================================================================
    // Party
    // ========================================================================

    /// Replace the party roster and return the first member's turn.
    pub async fn start_party(&self, members: Vec<String>) -> Result<String, SessionError> {
        let mut party = self.party.lock().await;
        Ok(party.start(members)?.to_string())
    }

    /// Advance to the next member's turn.
    pub async fn next_turn(&self) -> Result<String, SessionError> {
        let mut party = self.party.lock().await;
        Ok(party.advance()?.to_string())
    }

    /// Append a member to the roster.
    pub async fn add_member(&self, name: impl Into<String>) {
        self.party.lock().await.add(name);
    }

    /// Clear the roster.
    pub async fn end_party(&self) {
        self.party.lock().await.end();
    }

    pub async fn current_member(&self) -> Option<String> {
        self.party.lock().await.current().map(str::to_string)
    }

    pub async fn party_members(&self) -> Vec<String> {
        self.party.lock().await.members().to_vec()
    }

    // ========================================================================
    // Narrative requests
    // ========================================================================

    /// Process one player action end to end.
    ///
    /// Rolls the action dice (plus any passive bonus earned by the prompt),
    /// replays the quest log into a transcript, asks the narrator for a
    /// reply, and persists the completed exchange. Nothing is logged unless
    /// the whole exchange succeeds, so history only ever contains completed
    /// quests.
    pub async fn handle_narrative_request(
        &self,
        player: &PlayerId,
        prompt: &str,
    ) -> Result<QuestResponse, SessionError> {
        let (descriptor, bonus) = {
            let characters = self.characters.lock().await;
            match characters.get(player) {
                Some(character) => (character.descriptor(), passive_bonus(character, prompt)),
                None => (UNNAMED_ADVENTURER.to_string(), 0),
            }
        };

        let roll = self.roll_action(bonus);
        if roll.is_degraded() {
            warn!(
                formula = %self.config.action_formula,
                "action formula did not parse, rolling 0"
            );
        }

        let entries = self.log.recent(self.config.memory_window).await?;
        let window = memory::replay(&entries);
        debug!(
            exchanges = window.exchange_count(),
            skipped = window.skipped.len(),
            next_quest_id = window.next_quest_id,
            "replayed quest log"
        );

        // Concurrent requests replaying the same history can both claim
        // this id. Numbering is derived from observed history rather than
        // a stored counter, so duplicates are possible under concurrency.
        let quest_id = window.next_quest_id;

        let action = format!("{descriptor} {prompt} (Roll: {})", roll.total);
        let mut request = NarrationRequest::new(window.turns, action);
        if let Some(system) = &self.config.system_prompt {
            request = request.with_system(system.clone());
        }

        let narrate = self.narrator.narrate(request);
        let narrative = match timeout(self.config.request_timeout, narrate).await {
            Ok(Ok(narrative)) => narrative,
            Ok(Err(err)) => {
                warn!(error = %err, "narration failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(timeout = ?self.config.request_timeout, "narration timed out");
                return Err(SessionError::Timeout(self.config.request_timeout));
            }
        };

        let record = QuestRecord::new(
            quest_id,
            Local::now().format(TIMESTAMP_FORMAT).to_string(),
            prompt,
            roll.total,
            narrative.clone(),
        );
        self.log.append(&record.to_log_string()).await?;
        info!(quest_id, roll = roll.total, "quest completed");

        Ok(QuestResponse {
            roll,
            narrative,
            quest_id,
        })
    }

    fn roll_action(&self, bonus: i32) -> RollResult {
        match DiceFormula::parse(&self.config.action_formula) {
            Ok(formula) => formula.with_bonus(bonus).roll(),
            Err(_) => RollResult::degraded(&self.config.action_formula),
        }
    }
}
