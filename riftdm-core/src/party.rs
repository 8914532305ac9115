//! Party turn rotation.
//!
//! A single rotation over member display names: the tracker is empty until
//! a party starts, then holds an ordered list and a current-turn index
//! advanced modulo the party size. Rotation is a plain modular increment;
//! there is no skip logic for absent or incapacitated members.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from party tracking operations.
#[derive(Debug, Error)]
pub enum PartyError {
    #[error("You must specify at least one party member")]
    NoMembers,
    #[error("No party members set")]
    NoActiveParty,
}

/// Ordered turn rotation over party member names.
///
/// The empty state is an empty member list; the index is always valid
/// modulo the current length when members are present. Duplicate names are
/// permitted and not deduplicated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyTracker {
    members: Vec<String>,
    current: usize,
}

impl PartyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the party wholesale and reset the rotation to the first
    /// member.
    ///
    /// An empty member list clears any existing party and reports the
    /// validation failure.
    pub fn start(&mut self, members: Vec<String>) -> Result<&str, PartyError> {
        self.members = members;
        self.current = 0;
        if self.members.is_empty() {
            return Err(PartyError::NoMembers);
        }
        Ok(&self.members[self.current])
    }

    /// Advance the rotation and return the member now up.
    pub fn advance(&mut self) -> Result<&str, PartyError> {
        if self.members.is_empty() {
            return Err(PartyError::NoActiveParty);
        }
        self.current = (self.current + 1) % self.members.len();
        Ok(&self.members[self.current])
    }

    /// Append a member to the order.
    ///
    /// Adding to an empty tracker starts a one-member party with the turn
    /// on that member.
    pub fn add(&mut self, name: impl Into<String>) {
        self.members.push(name.into());
    }

    /// End turn tracking, discarding the order and index.
    pub fn end(&mut self) {
        self.members.clear();
        self.current = 0;
    }

    /// Name of the member whose turn it is, if a party is active.
    pub fn current(&self) -> Option<&str> {
        self.members.get(self.current).map(String::as_str)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_active(&self) -> bool {
        !self.members.is_empty()
    }
}
