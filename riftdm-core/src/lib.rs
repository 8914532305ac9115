//! Session-state engine for collaborative turn-based narrative play.
//!
//! This crate provides:
//! - Dice formula parsing and rolling with graceful degradation
//! - Character sheets with data-driven passive bonuses
//! - Party turn rotation
//! - Conversation memory replayed from a persistent quest log
//! - An AI narrator orchestrated into a single request pipeline
//!
//! # Quick Start
//!
//! ```ignore
//! use riftdm_core::{
//!     DmNarrator, FileQuestLog, PlayerId, SessionConfig, SessionEngine,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = openrouter::OpenRouter::from_env()?;
//!     let engine = SessionEngine::new(
//!         SessionConfig::new(),
//!         DmNarrator::new(client),
//!         FileQuestLog::new("quest.log"),
//!     );
//!
//!     let player = PlayerId::new("rhea");
//!     engine
//!         .create_character(player.clone(), "Elira", "elf", "rogue", None)
//!         .await;
//!
//!     let response = engine
//!         .handle_narrative_request(&player, "I search the room")
//!         .await?;
//!     println!("(Roll: {}) {}", response.roll.total, response.narrative);
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod dice;
pub mod log;
pub mod memory;
pub mod narrator;
pub mod party;
pub mod session;
pub mod testing;

// Primary public API
pub use character::{passive_bonus, Character, CharacterStore, PlayerId};
pub use dice::{bonus_d20, roll_or_zero, DiceFormula, RollResult};
pub use log::{FileQuestLog, QuestLog};
pub use memory::{replay, ConversationWindow, QuestRecord, MEMORY_WINDOW};
pub use narrator::{DmNarrator, NarrationRequest, Narrator};
pub use party::PartyTracker;
pub use session::{QuestResponse, SessionConfig, SessionEngine, SessionError};
pub use testing::{ScriptedNarrator, TestSession};
