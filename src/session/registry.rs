//! Conversation registry and the conversation lifecycle helpers:
//! time-derived ids, greeting seed, lazy title derivation.

use chrono::Utc;

use crate::models::{Conversation, Message};

/// Placeholder title until the conversation has a user message.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Assistant greeting seeded into every fresh conversation.
pub const GREETING: &str = "Hi, I'm the Course Graph Chatbot! How can I help you?";

/// Titles longer than this many characters are truncated with an ellipsis.
const TITLE_MAX_CHARS: usize = 50;

/// Generate a conversation title from the first user message.
/// Truncates at 50 characters with "..." if longer, counting characters
/// rather than bytes so multibyte text never splits mid-character.
pub fn generate_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    match trimmed.char_indices().nth(TITLE_MAX_CHARS) {
        None => trimmed.to_string(),
        Some((boundary, _)) => format!("{}...", &trimmed[..boundary]),
    }
}

/// Next conversation id: the current UTC time in milliseconds, bumped past
/// the floor when the clock has not advanced. The floor must cover every
/// id already minted for the session (current conversation and the whole
/// registry), so ids stay strictly increasing by creation order and a
/// fresh id can never collide with an archived one.
pub fn next_conversation_id(floor: i64) -> String {
    let now = Utc::now().timestamp_millis();
    if now > floor {
        now.to_string()
    } else {
        (floor + 1).to_string()
    }
}

/// A fresh conversation holding only the seeded greeting.
pub fn seed_conversation(id: String) -> Conversation {
    Conversation {
        id,
        title: DEFAULT_TITLE.to_string(),
        messages: vec![Message::assistant(GREETING)],
    }
}

/// Archive of saved conversations, insertion-ordered.
///
/// `save` is last-write-wins on id: a conversation with a known id replaces
/// the stored one entirely, a new id appends. Titles are derived lazily at
/// save time and never recomputed once set.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    entries: Vec<Conversation>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id. Derives the title from the first user
    /// message when still at the placeholder.
    pub fn save(&mut self, conversation: &Conversation) {
        let mut stored = conversation.clone();
        let existing_index = self.entries.iter().position(|c| c.id == stored.id);

        // A previously derived title is never recomputed.
        if stored.title == DEFAULT_TITLE {
            if let Some(index) = existing_index {
                if self.entries[index].title != DEFAULT_TITLE {
                    stored.title = self.entries[index].title.clone();
                }
            }
        }
        if stored.title == DEFAULT_TITLE {
            if let Some(first) = stored.first_user_message() {
                stored.title = generate_title(first);
            }
        }

        match existing_index {
            Some(index) => self.entries[index] = stored,
            None => self.entries.push(stored),
        }
    }

    /// Saved conversations, newest-first.
    pub fn list(&self) -> impl Iterator<Item = &Conversation> {
        self.entries.iter().rev()
    }

    /// Exact id lookup. Absence is the caller's reportable condition.
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Largest numeric id in the registry, 0 when empty. Part of the
    /// floor for minting new ids.
    pub fn max_id(&self) -> i64 {
        self.entries
            .iter()
            .filter_map(|c| c.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn conversation(id: &str, messages: Vec<Message>) -> Conversation {
        Conversation {
            id: id.to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages,
        }
    }

    #[test]
    fn title_keeps_short_message_whole() {
        assert_eq!(generate_title("Explain the Paragraph"), "Explain the Paragraph");
    }

    #[test]
    fn title_truncates_at_fifty_chars_with_ellipsis() {
        let message = "a".repeat(60);
        let title = generate_title(&message);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn title_of_exactly_fifty_chars_has_no_ellipsis() {
        let message = "b".repeat(50);
        assert_eq!(generate_title(&message), message);
    }

    #[test]
    fn title_handles_multibyte_text() {
        let message = "é".repeat(60);
        let title = generate_title(&message);
        assert_eq!(title.chars().count(), 53); // 50 + "..."
        assert!(title.starts_with(&"é".repeat(50)));
    }

    #[test]
    fn title_of_blank_message_stays_placeholder() {
        assert_eq!(generate_title("   "), DEFAULT_TITLE);
    }

    #[test]
    fn ids_strictly_increase() {
        let first = next_conversation_id(0);
        let second = next_conversation_id(first.parse().unwrap());
        let third = next_conversation_id(second.parse().unwrap());
        assert!(second.parse::<i64>().unwrap() > first.parse::<i64>().unwrap());
        assert!(third.parse::<i64>().unwrap() > second.parse::<i64>().unwrap());
    }

    #[test]
    fn max_id_tracks_the_largest_entry() {
        let mut registry = ConversationRegistry::new();
        assert_eq!(registry.max_id(), 0);

        registry.save(&conversation("100", vec![Message::user("a")]));
        registry.save(&conversation("300", vec![Message::user("b")]));
        registry.save(&conversation("200", vec![Message::user("c")]));
        assert_eq!(registry.max_id(), 300);
    }

    #[test]
    fn seed_conversation_has_one_greeting() {
        let conv = seed_conversation("1".into());
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].role, MessageRole::Assistant);
        assert_eq!(conv.messages[0].content, GREETING);
        assert_eq!(conv.title, DEFAULT_TITLE);
    }

    #[test]
    fn save_is_last_write_wins_by_id() {
        let mut registry = ConversationRegistry::new();
        registry.save(&conversation("1", vec![Message::user("first")]));
        registry.save(&conversation("2", vec![Message::user("other")]));
        registry.save(&conversation(
            "1",
            vec![Message::user("first"), Message::assistant("reply")],
        ));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("1").unwrap().messages.len(), 2);
    }

    #[test]
    fn repeated_identical_saves_are_idempotent() {
        let mut registry = ConversationRegistry::new();
        let conv = conversation("1", vec![Message::user("hello")]);
        registry.save(&conv);
        registry.save(&conv);
        registry.save(&conv);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn save_derives_title_from_first_user_message() {
        let mut registry = ConversationRegistry::new();
        registry.save(&conversation(
            "1",
            vec![
                Message::assistant(GREETING),
                Message::user("What is the neural crest?"),
            ],
        ));
        assert_eq!(registry.get("1").unwrap().title, "What is the neural crest?");
    }

    #[test]
    fn derived_title_is_stable_under_later_saves() {
        let mut registry = ConversationRegistry::new();
        registry.save(&conversation("1", vec![Message::user("Original question")]));

        // Re-save with the placeholder title and a different first message;
        // the stored title must not change.
        registry.save(&conversation("1", vec![Message::user("Different question")]));
        assert_eq!(registry.get("1").unwrap().title, "Original question");
    }

    #[test]
    fn save_without_user_message_keeps_placeholder() {
        let mut registry = ConversationRegistry::new();
        registry.save(&conversation("1", vec![Message::assistant(GREETING)]));
        assert_eq!(registry.get("1").unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn list_is_newest_first() {
        let mut registry = ConversationRegistry::new();
        registry.save(&conversation("1", vec![Message::user("a")]));
        registry.save(&conversation("2", vec![Message::user("b")]));
        registry.save(&conversation("3", vec![Message::user("c")]));

        let ids: Vec<&str> = registry.list().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn get_missing_id_is_none() {
        let registry = ConversationRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
