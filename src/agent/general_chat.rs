use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::models::Message;

use super::capability::{Capability, GENERAL_CHAT};
use super::prompt::{build_general_chat_prompt, GENERAL_CHAT_SYSTEM_PROMPT};
use super::AgentError;

/// Fallback capability: answers from conversation context only, with the
/// system prompt forbidding any pre-trained knowledge.
pub struct GeneralChat {
    generator: Arc<dyn TextGenerator>,
}

impl GeneralChat {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

impl Capability for GeneralChat {
    fn name(&self) -> &'static str {
        GENERAL_CHAT
    }

    fn description(&self) -> &'static str {
        "For general chat about the course not covered by the other capabilities"
    }

    fn handle(&self, utterance: &str, history: &[Message]) -> Result<String, AgentError> {
        let prompt = build_general_chat_prompt(utterance, history);
        Ok(self.generator.generate(GENERAL_CHAT_SYSTEM_PROMPT, &prompt)?)
    }
}
