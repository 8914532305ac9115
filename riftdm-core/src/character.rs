//! Player characters and passive bonuses.
//!
//! Characters are keyed by an opaque player identity. Passive traits grant
//! conditional roll bonuses through a data-driven rule table: each rule
//! names the passive tag, the prompt keywords that trigger it, and the
//! bonus it grants. New passives are added by extending the table, not the
//! lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque key identifying one player across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ability scores on a character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub intelligence: u8,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            intelligence: 10,
        }
    }
}

/// A player's character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub class: String,
    pub personality: Option<String>,
    pub stats: AbilityScores,
    pub passives: Vec<String>,
    pub inventory: Vec<String>,
}

impl Character {
    /// Create a sheet with default stats and no passives or inventory.
    pub fn new(
        name: impl Into<String>,
        race: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            race: race.into(),
            class: class.into(),
            personality: None,
            stats: AbilityScores::default(),
            passives: Vec::new(),
            inventory: Vec::new(),
        }
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = Some(personality.into());
        self
    }

    pub fn with_passive(mut self, passive: impl Into<String>) -> Self {
        self.passives.push(passive.into());
        self
    }

    /// Second-person descriptor that opens the generation prompt.
    pub fn descriptor(&self) -> String {
        match &self.personality {
            Some(personality) => format!(
                "You are {}, a {} {} with a {personality} personality.",
                self.name, self.race, self.class
            ),
            None => format!("You are {}, a {} {}.", self.name, self.race, self.class),
        }
    }
}

/// Descriptor used when a player has no character.
pub const UNNAMED_ADVENTURER: &str = "You are an unnamed adventurer.";

/// In-memory store mapping player identity to character sheet.
///
/// At most one character exists per player; creation overwrites wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterStore {
    characters: HashMap<PlayerId, Character>,
}

impl CharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a sheet for a player, replacing any existing one.
    pub fn create(
        &mut self,
        player: PlayerId,
        name: impl Into<String>,
        race: impl Into<String>,
        class: impl Into<String>,
        personality: Option<String>,
    ) -> Character {
        let mut character = Character::new(name, race, class);
        character.personality = personality;
        self.characters.insert(player, character.clone());
        character
    }

    /// Store a fully-built sheet, replacing any existing one.
    pub fn insert(&mut self, player: PlayerId, character: Character) {
        self.characters.insert(player, character);
    }

    pub fn get(&self, player: &PlayerId) -> Option<&Character> {
        self.characters.get(player)
    }

    /// Remove a player's character. Returns false when none existed.
    pub fn delete(&mut self, player: &PlayerId) -> bool {
        self.characters.remove(player).is_some()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

/// A rule granting a roll bonus when a passive's keywords appear in the
/// action prompt.
#[derive(Debug, Clone, Copy)]
pub struct PassiveRule {
    /// Exact tag that must be present on the character sheet.
    pub tag: &'static str,
    /// Substrings matched case-insensitively against the prompt.
    pub keywords: &'static [&'static str],
    pub bonus: i32,
}

/// Shipped passive rules.
pub const PASSIVE_RULES: &[PassiveRule] = &[
    PassiveRule {
        tag: "Expertise in Sleight of Hand",
        keywords: &["pick", "steal"],
        bonus: 2,
    },
    PassiveRule {
        tag: "Ambidextrous",
        keywords: &["hands"],
        bonus: 2,
    },
];

/// Total bonus granted by a character's passives for an action prompt.
///
/// Matching rules stack additively.
pub fn passive_bonus(character: &Character, prompt: &str) -> i32 {
    let prompt = prompt.to_lowercase();
    PASSIVE_RULES
        .iter()
        .filter(|rule| character.passives.iter().any(|tag| tag == rule.tag))
        .filter(|rule| rule.keywords.iter().any(|keyword| prompt.contains(keyword)))
        .map(|rule| rule.bonus)
        .sum()
}
