use std::sync::Arc;

use crate::graph::PassageSearch;
use crate::llm::{Embedder, TextGenerator};
use crate::models::Message;

use super::capability::{Capability, PARAGRAPH_SEARCH};
use super::prompt::{build_rag_prompt, no_match_response, RAG_SYSTEM_PROMPT};
use super::AgentError;

/// Retrieval-augmented capability: embed the utterance, fetch the top-K
/// nearest course paragraphs, and synthesize an answer strictly from the
/// retrieved text. Declines instead of fabricating when nothing clears
/// the score threshold.
pub struct ParagraphSearch {
    embedder: Arc<dyn Embedder>,
    passages: Arc<dyn PassageSearch>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    min_score: f32,
}

impl ParagraphSearch {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        passages: Arc<dyn PassageSearch>,
        generator: Arc<dyn TextGenerator>,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        Self {
            embedder,
            passages,
            generator,
            top_k,
            min_score,
        }
    }
}

impl Capability for ParagraphSearch {
    fn name(&self) -> &'static str {
        PARAGRAPH_SEARCH
    }

    fn description(&self) -> &'static str {
        "For answers based on searching and explaining course content by similarity"
    }

    fn handle(&self, utterance: &str, history: &[Message]) -> Result<String, AgentError> {
        let embedding = self.embedder.embed(utterance)?;
        let mut retrieved = self.passages.search(&embedding, self.top_k)?;
        retrieved.retain(|p| p.score >= self.min_score);

        if retrieved.is_empty() {
            tracing::debug!(utterance, "no passage above threshold; declining");
            return Ok(no_match_response());
        }

        tracing::debug!(
            retrieved = retrieved.len(),
            best_score = retrieved[0].score,
            "synthesizing from retrieved paragraphs"
        );
        let prompt = build_rag_prompt(utterance, &retrieved, history);
        Ok(self.generator.generate(RAG_SYSTEM_PROMPT, &prompt)?)
    }
}
