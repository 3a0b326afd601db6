//! In-memory passage search used by tests and offline runs — cosine
//! similarity over stored embeddings, same contract as the Neo4j index.

use super::{GraphError, PassageSearch, ScoredPassage};

pub struct InMemoryPassageSearch {
    entries: Vec<StoredPassage>,
}

struct StoredPassage {
    text: String,
    embedding: Vec<f32>,
    course: Option<String>,
    module: Option<String>,
    lesson: Option<String>,
    topics: Vec<String>,
}

impl InMemoryPassageSearch {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(
        &mut self,
        text: &str,
        embedding: Vec<f32>,
        course: Option<&str>,
        module: Option<&str>,
        lesson: Option<&str>,
        topics: &[&str],
    ) {
        self.entries.push(StoredPassage {
            text: text.to_string(),
            embedding,
            course: course.map(|s| s.to_string()),
            module: module.map(|s| s.to_string()),
            lesson: lesson.map(|s| s.to_string()),
            topics: topics.iter().map(|s| s.to_string()).collect(),
        });
    }
}

impl Default for InMemoryPassageSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl PassageSearch for InMemoryPassageSearch {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, GraphError> {
        let mut scored: Vec<(f32, &StoredPassage)> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (score, entry)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredPassage {
                text: entry.text.clone(),
                score,
                course: entry.course.clone(),
                module: entry.module.clone(),
                lesson: entry.lesson.clone(),
                topics: entry.topics.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
