//! Narrator seam between session logic and the language model.
//!
//! The session engine talks to an abstract [`Narrator`] so that tests can
//! substitute scripted replies; [`DmNarrator`] is the shipping
//! implementation, forwarding to an OpenRouter chat model.

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::{Role, Turn};

/// System prompt given to the narrator on every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("prompts/narrator.txt");

/// Errors from the narration backend.
#[derive(Debug, Error)]
pub enum NarrateError {
    #[error("narration backend error: {0}")]
    Backend(#[from] openrouter::Error),
}

/// Everything the narrator needs for one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationRequest {
    /// System instruction establishing tone and constraints.
    pub system: String,
    /// Replayed conversation, oldest first.
    pub transcript: Vec<Turn>,
    /// Final user turn: character descriptor, action, and roll.
    pub action: String,
}

impl NarrationRequest {
    pub fn new(transcript: Vec<Turn>, action: impl Into<String>) -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            transcript,
            action: action.into(),
        }
    }

    /// Replace the bundled system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }
}

/// Produces one narrative reply for a prepared request.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, request: NarrationRequest) -> Result<String, NarrateError>;
}

/// Narrator backed by an OpenRouter chat model.
#[derive(Clone)]
pub struct DmNarrator {
    client: openrouter::OpenRouter,
}

impl DmNarrator {
    pub fn new(client: openrouter::OpenRouter) -> Self {
        Self { client }
    }

    fn messages_for(request: &NarrationRequest) -> Vec<openrouter::Message> {
        let mut messages = Vec::with_capacity(request.transcript.len() + 2);
        messages.push(openrouter::Message::system(request.system.as_str()));
        for turn in &request.transcript {
            messages.push(match turn.role {
                Role::User => openrouter::Message::user(turn.text.as_str()),
                Role::Assistant => openrouter::Message::assistant(turn.text.as_str()),
            });
        }
        messages.push(openrouter::Message::user(request.action.as_str()));
        messages
    }
}

#[async_trait]
impl Narrator for DmNarrator {
    async fn narrate(&self, request: NarrationRequest) -> Result<String, NarrateError> {
        let api_request = openrouter::Request::new(Self::messages_for(&request));
        let response = self.client.complete(api_request).await?;
        Ok(response.content.trim().to_string())
    }
}
