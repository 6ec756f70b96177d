//! Inbound conversation and its request-scoped invariants.

use generate::{ChatMessage, Role};
use serde::Serialize;

use crate::RagError;

/// One `{role, content}` turn as received from the caller.
pub type ConversationTurn = ChatMessage;

/// A validated, non-empty conversation whose last turn is user-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new(turns: Vec<ConversationTurn>) -> Result<Self, RagError> {
        let Some(active) = turns.last() else {
            return Err(RagError::InvalidConversation(
                "conversation must contain at least one turn".into(),
            ));
        };
        if active.role != Role::User {
            return Err(RagError::InvalidConversation(format!(
                "last turn must come from the user, got {}",
                active.role
            )));
        }
        if active.content.trim().is_empty() {
            return Err(RagError::InvalidConversation(
                "last user turn has no content".into(),
            ));
        }
        // The assembled prompt carries exactly one system message: ours.
        if let Some(pos) = turns.iter().position(|t| t.role == Role::System) {
            return Err(RagError::InvalidConversation(format!(
                "turn {pos} has role system; system instructions are not accepted from callers"
            )));
        }
        Ok(Self { turns })
    }

    /// The latest user turn; its text drives retrieval.
    pub fn active_turn(&self) -> &ConversationTurn {
        // Non-empty by construction.
        &self.turns[self.turns.len() - 1]
    }

    /// Every turn before the active one, in original order.
    pub fn prior_history(&self) -> &[ConversationTurn] {
        &self.turns[..self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl TryFrom<Vec<ConversationTurn>> for Conversation {
    type Error = RagError;

    fn try_from(turns: Vec<ConversationTurn>) -> Result<Self, Self::Error> {
        Self::new(turns)
    }
}
