//! Short-term conversation memory, windowed to a fixed number of turns.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Maximum number of user/assistant pairs retained per conversation.
pub const MAX_TURNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Per-conversation turn history. Process-lifetime and unbounded across
/// distinct conversation ids; each id's history is bounded to
/// `2 * MAX_TURNS` entries with the oldest dropped first.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: DashMap<String, Vec<ConversationTurn>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns for a conversation, oldest first. Empty for an unknown id.
    pub fn get(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .get(conversation_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Append one turn, evicting the oldest entries once the window bound is
    /// exceeded. The even bound plus paired user/assistant appends keeps the
    /// remaining history alternating.
    pub fn append(&self, conversation_id: &str, role: Role, content: impl Into<String>) {
        let mut entry = self.turns.entry(conversation_id.to_string()).or_default();
        entry.push(ConversationTurn {
            role,
            content: content.into(),
        });
        let excess = entry.len().saturating_sub(MAX_TURNS * 2);
        if excess > 0 {
            entry.drain(..excess);
        }
    }
}
