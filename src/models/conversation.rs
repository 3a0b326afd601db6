use serde::{Deserialize, Serialize};

use super::enums::MessageRole;

/// A single chat turn. Immutable once created; ordering within a
/// conversation is the conversation's temporal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation: time-derived id, display title, and the ordered
/// message log.
///
/// Ids are decimal UTC-millisecond strings, strictly increasing by
/// creation order within a session (see `session::registry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Content of the first user-role message, if any. Source for lazy
    /// title derivation.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}
