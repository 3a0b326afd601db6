use crate::models::Message;

use super::AgentError;

pub const GENERAL_CHAT: &str = "General Chat";
pub const PARAGRAPH_SEARCH: &str = "Course Paragraph Search";
pub const STRUCTURED_QUERY: &str = "Course Structured Query";

/// A named, independently invocable answer-producing function exposed to
/// the router. Capabilities are mutually exclusive per turn and every
/// capability receives the same utterance and prior-turn history.
pub trait Capability: Send + Sync {
    fn name(&self) -> &'static str;

    /// One-line intent description, matched against the utterance by the
    /// selection policy.
    fn description(&self) -> &'static str;

    fn handle(&self, utterance: &str, history: &[Message]) -> Result<String, AgentError>;
}
