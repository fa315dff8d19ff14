//! Conversation data model.
//!
//! A dialogue is an ordered list of immutable turns. Roles alternate
//! strictly: the user opens the conversation, so the role of an utterance
//! is determined by its position, not stored per message. Empty utterances
//! still occupy a position (they matter for parity).

use serde::{Deserialize, Serialize};

/// Who uttered a turn. Positional: even positions are the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    System,
}

impl Role {
    /// Role of the utterance at `position` in the full turn sequence,
    /// counting empties.
    pub fn for_position(position: usize) -> Role {
        if position % 2 == 0 {
            Role::User
        } else {
            Role::System
        }
    }

    /// The tag prepended to an utterance when building model context.
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::User => "User: ",
            Role::System => "System: ",
        }
    }
}

/// A single conversation turn. Never mutated after creation.
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

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: text.into(),
        }
    }
}

/// The per-call assembly of everything a backbone needs about the dialogue
/// so far. Built fresh for every reply, never persisted.
///
/// `targets` (ground-truth items) and `response` (gold reply) are only
/// populated in labeled evaluation; at inference they stay empty and are
/// carried for compatibility with training-style examples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// All utterance texts in turn order, the new input message last.
    pub utterances: Vec<String>,
    /// Entity mentions accumulated across the utterances, in order of
    /// appearance, duplicates included.
    pub mentions: Vec<String>,
    /// Ground-truth recommendation targets (evaluation only).
    pub targets: Vec<String>,
    /// Gold response text (evaluation only).
    pub response: String,
}

impl ConversationContext {
    /// Assemble the context for a new turn: prior history plus the
    /// incoming message.
    pub fn from_turns(history: &[Turn], input_message: &str) -> Self {
        let utterances = history
            .iter()
            .map(|turn| turn.text.clone())
            .chain(std::iter::once(input_message.to_string()))
            .collect();
        Self {
            utterances,
            ..Self::default()
        }
    }
}
