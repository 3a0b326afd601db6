//! Capability selection policies.
//!
//! Selection is a pluggable external judgment, not core logic: the
//! router only requires "one name per utterance". The LLM-backed policy
//! mirrors the original agent's behavior; the keyword policy is a
//! deterministic stand-in for tests and offline use.

use std::sync::Arc;

use crate::llm::TextGenerator;

use super::capability::{GENERAL_CHAT, PARAGRAPH_SEARCH, STRUCTURED_QUERY};
use super::prompt::{build_selection_prompt, SELECTION_SYSTEM_PROMPT};
use super::AgentError;

/// Chooses one capability name for an utterance, given the capability
/// names and descriptions.
pub trait SelectionPolicy: Send + Sync {
    fn select(
        &self,
        utterance: &str,
        capabilities: &[(String, String)],
    ) -> Result<String, AgentError>;
}

/// Asks the LLM to pick a capability by name. Non-deterministic by
/// nature; the router falls back to General Chat when the answer names
/// no known capability.
pub struct LlmSelectionPolicy {
    generator: Arc<dyn TextGenerator>,
}

impl LlmSelectionPolicy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

impl SelectionPolicy for LlmSelectionPolicy {
    fn select(
        &self,
        utterance: &str,
        capabilities: &[(String, String)],
    ) -> Result<String, AgentError> {
        let prompt = build_selection_prompt(utterance, capabilities);
        let answer = self.generator.generate(SELECTION_SYSTEM_PROMPT, &prompt)?;
        let lowered = answer.to_lowercase();

        capabilities
            .iter()
            .find(|(name, _)| lowered.contains(&name.to_lowercase()))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| AgentError::Selection(format!("unrecognized answer: {answer}")))
    }
}

/// Keyword heuristics over the utterance. Deterministic and offline.
pub struct KeywordSelectionPolicy;

impl SelectionPolicy for KeywordSelectionPolicy {
    fn select(
        &self,
        utterance: &str,
        _capabilities: &[(String, String)],
    ) -> Result<String, AgentError> {
        let lower = utterance.to_lowercase();

        if has_structured_pattern(&lower) {
            return Ok(STRUCTURED_QUERY.to_string());
        }
        if has_search_pattern(&lower) {
            return Ok(PARAGRAPH_SEARCH.to_string());
        }
        Ok(GENERAL_CHAT.to_string())
    }
}

fn has_structured_pattern(text: &str) -> bool {
    let patterns = [
        "how many",
        "list the",
        "list all",
        "which course",
        "which module",
        "which lesson",
        "which topic",
        "what modules",
        "what lessons",
        "what topics",
        "what courses",
        "name the",
        "count",
    ];
    patterns.iter().any(|p| contains_phrase(text, p))
}

fn has_search_pattern(text: &str) -> bool {
    let patterns = [
        "explain",
        "what is",
        "what are",
        "describe",
        "tell me about",
        "summarize",
        "search",
        "find",
        "details about",
        "according to the course",
    ];
    patterns.iter().any(|p| contains_phrase(text, p))
}

/// Phrase match on word boundaries: "count" must not fire inside
/// "account", nor "find" inside "finding".
fn contains_phrase(text: &str, phrase: &str) -> bool {
    let bytes = text.as_bytes();
    text.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ollama::ScriptedLlm;

    fn capability_specs() -> Vec<(String, String)> {
        vec![
            (GENERAL_CHAT.to_string(), "general chat about the course".to_string()),
            (PARAGRAPH_SEARCH.to_string(), "similarity search in course content".to_string()),
            (STRUCTURED_QUERY.to_string(), "structured fact lookups".to_string()),
        ]
    }

    #[test]
    fn keyword_policy_routes_structure_questions_to_cypher() {
        let policy = KeywordSelectionPolicy;
        for q in [
            "How many lessons does the Embryology course have?",
            "List the modules of the anatomy course",
            "Which lesson covers neurulation?",
        ] {
            assert_eq!(policy.select(q, &capability_specs()).unwrap(), STRUCTURED_QUERY, "{q}");
        }
    }

    #[test]
    fn keyword_policy_routes_content_questions_to_search() {
        let policy = KeywordSelectionPolicy;
        for q in [
            "Explain the neural crest",
            "What is neurulation?",
            "Tell me about skeletal formation",
        ] {
            assert_eq!(policy.select(q, &capability_specs()).unwrap(), PARAGRAPH_SEARCH, "{q}");
        }
    }

    #[test]
    fn keyword_policy_falls_back_to_general_chat() {
        let policy = KeywordSelectionPolicy;
        assert_eq!(policy.select("Hello!", &capability_specs()).unwrap(), GENERAL_CHAT);
        assert_eq!(policy.select("Thanks, that helped", &capability_specs()).unwrap(), GENERAL_CHAT);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let policy = KeywordSelectionPolicy;
        // "account" contains "count" and "finding" contains "find";
        // neither is a keyword hit.
        assert_eq!(
            policy.select("There is a problem with my account", &capability_specs()).unwrap(),
            GENERAL_CHAT
        );
        assert_eq!(
            policy.select("I'm finding this course hard", &capability_specs()).unwrap(),
            GENERAL_CHAT
        );
        assert_eq!(
            policy.select("count the lessons per module", &capability_specs()).unwrap(),
            STRUCTURED_QUERY
        );
        assert_eq!(
            policy.select("find paragraphs on neurulation", &capability_specs()).unwrap(),
            PARAGRAPH_SEARCH
        );
    }

    #[test]
    fn llm_policy_matches_name_in_answer() {
        let llm = Arc::new(ScriptedLlm::new("Course Paragraph Search"));
        let policy = LlmSelectionPolicy::new(llm);
        assert_eq!(
            policy.select("Explain the neural crest", &capability_specs()).unwrap(),
            PARAGRAPH_SEARCH
        );
    }

    #[test]
    fn llm_policy_tolerates_chatty_answers() {
        let llm = Arc::new(ScriptedLlm::new(
            "The best capability is: course structured query.",
        ));
        let policy = LlmSelectionPolicy::new(llm);
        assert_eq!(
            policy.select("How many modules?", &capability_specs()).unwrap(),
            STRUCTURED_QUERY
        );
    }

    #[test]
    fn llm_policy_rejects_unknown_names() {
        let llm = Arc::new(ScriptedLlm::new("Weather Forecast"));
        let policy = LlmSelectionPolicy::new(llm);
        let err = policy.select("anything", &capability_specs()).unwrap_err();
        assert!(matches!(err, AgentError::Selection(_)));
    }
}
