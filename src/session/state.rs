//! Per-session state machine.
//!
//! All conversation bookkeeping is an explicit transition on a
//! per-session state object — nothing lives in process globals and
//! nothing here renders or calls a collaborator. The presentation layer
//! runs the capability router first, then applies `SubmitMessage` with
//! the finished exchange.

use crate::models::{Conversation, Message, MessageRole};

use super::registry::{next_conversation_id, seed_conversation, ConversationRegistry};

/// Named transitions on a session's conversation state.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Archive the current conversation (when it has a user message) and
    /// reseed with a strictly newer id.
    NewConversation,
    /// Append a completed exchange and save the conversation.
    SubmitMessage { user: String, assistant: String },
    /// Switch to an archived conversation; an unknown id is logged and
    /// leaves state unchanged.
    LoadConversation { id: String },
    /// Empty the registry and reseed the current conversation.
    ClearHistory,
}

/// One user session: the current conversation plus the archive.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: String,
    pub current: Conversation,
    pub registry: ConversationRegistry,
}

impl SessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            current: seed_conversation(next_conversation_id(0)),
            registry: ConversationRegistry::new(),
        }
    }

    /// Floor for minting the next id: the current conversation and every
    /// archived one. Loading an old conversation must not let a fresh id
    /// collide with an archived id.
    fn id_floor(&self) -> i64 {
        let current = self.current.id.parse::<i64>().unwrap_or(0);
        current.max(self.registry.max_id())
    }

    /// Apply one transition.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SubmitMessage { user, assistant } => {
                self.current.messages.push(Message::user(user));
                self.current.messages.push(Message::assistant(assistant));
                self.registry.save(&self.current);
                // The registry derives the title; reflect it on the
                // current conversation for display.
                if let Some(saved) = self.registry.get(&self.current.id) {
                    self.current.title = saved.title.clone();
                }
            }
            SessionEvent::NewConversation => {
                let has_user_turn = self
                    .current
                    .messages
                    .iter()
                    .any(|m| m.role == MessageRole::User);
                if has_user_turn {
                    self.registry.save(&self.current);
                }
                self.current = seed_conversation(next_conversation_id(self.id_floor()));
            }
            SessionEvent::LoadConversation { id } => match self.registry.get(&id) {
                Some(conversation) => self.current = conversation.clone(),
                None => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        conversation_id = %id,
                        "conversation not found; keeping current conversation"
                    );
                }
            },
            SessionEvent::ClearHistory => {
                let floor = self.id_floor();
                self.registry.clear();
                self.current = seed_conversation(next_conversation_id(floor));
            }
        }
    }
}
