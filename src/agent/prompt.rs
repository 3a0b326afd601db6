//! Prompt templates for the three capabilities and the selection policy.

use crate::graph::schema::SCHEMA_TEXT;
use crate::graph::ScoredPassage;
use crate::models::{Message, MessageRole};

/// How many prior turns are replayed into a prompt.
const HISTORY_WINDOW: usize = 4;

pub const GENERAL_CHAT_SYSTEM_PROMPT: &str = "\
You are a teacher providing information about course content. Do not answer \
any questions using your pre-trained knowledge, only use the information \
provided in the context. If the conversation context does not contain the \
answer, say that you don't know.";

pub const RAG_SYSTEM_PROMPT: &str = "\
You are a teacher answering questions about course content. Use only the \
course paragraphs provided in the context to answer the question. If the \
context does not contain the answer, reply exactly: I don't know. Never \
invent course content.";

pub const CYPHER_SYSTEM_PROMPT: &str = "\
You are an expert Neo4j developer translating questions about courses into \
Cypher queries. Use only the node labels, relationship types and properties \
in the provided schema — never any other. Only generate read queries. Reply \
with a single Cypher query inside a ```cypher fenced block and nothing else.";

pub const SELECTION_SYSTEM_PROMPT: &str = "\
You route a student's question to exactly one capability. Reply with the \
name of the single best capability, exactly as written, and nothing else.";

/// Reply used when retrieval finds nothing sufficiently relevant.
pub fn no_match_response() -> String {
    "I don't know. Nothing in the course content matches that question.".to_string()
}

/// Reply used when a structured query returns no rows.
pub fn no_rows_response() -> String {
    "I didn't find anything in the course database for that question.".to_string()
}

/// Render the recent conversation history as a prompt block. Empty when
/// there is no history.
pub fn history_block(history: &[Message]) -> String {
    let recent: Vec<_> = history.iter().rev().take(HISTORY_WINDOW).rev().collect();
    if recent.is_empty() {
        return String::new();
    }

    let mut block = String::from("<CONVERSATION_HISTORY>\n");
    for msg in recent {
        let speaker = match msg.role {
            MessageRole::User => "Student",
            MessageRole::Assistant => "Teacher",
        };
        block.push_str(&format!("{}: {}\n", speaker, msg.content));
    }
    block.push_str("</CONVERSATION_HISTORY>\n\n");
    block
}

/// Prompt for the general chat capability: history plus the question.
pub fn build_general_chat_prompt(utterance: &str, history: &[Message]) -> String {
    let mut prompt = history_block(history);
    prompt.push_str(&format!("Student question: {utterance}\n\n"));
    prompt.push_str("Answer using only the conversation context above.");
    prompt
}

/// Prompt for retrieval-augmented answers: retrieved paragraphs with their
/// course/module/lesson/topic metadata, history, then the question.
pub fn build_rag_prompt(
    utterance: &str,
    passages: &[ScoredPassage],
    history: &[Message],
) -> String {
    let mut prompt = history_block(history);

    prompt.push_str("<COURSE_PARAGRAPHS>\n");
    for (i, passage) in passages.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n", i + 1, passage.text));
        let mut origin = Vec::new();
        if let Some(course) = &passage.course {
            origin.push(format!("course: {course}"));
        }
        if let Some(module) = &passage.module {
            origin.push(format!("module: {module}"));
        }
        if let Some(lesson) = &passage.lesson {
            origin.push(format!("lesson: {lesson}"));
        }
        if !passage.topics.is_empty() {
            origin.push(format!("topics: {}", passage.topics.join(", ")));
        }
        if !origin.is_empty() {
            prompt.push_str(&format!("    ({})\n", origin.join("; ")));
        }
    }
    prompt.push_str("</COURSE_PARAGRAPHS>\n\n");

    prompt.push_str(&format!("Student question: {utterance}\n\n"));
    prompt.push_str("Answer using only the course paragraphs above.");
    prompt
}

/// Prompt for Cypher generation: fixed schema, worked examples, question.
pub fn build_cypher_prompt(utterance: &str) -> String {
    format!(
        r#"Convert the user's question into a Cypher query against the course
schema below, focusing on finding the most relevant paragraphs, topics or
course structure. Use only the relationship types and properties provided.

Schema:
{SCHEMA_TEXT}

Example queries to draw on:

1. Paragraphs relevant to a specific topic:
```cypher
MATCH (p:Paragraph)-[:MENTIONS]->(t:Topic {{name: "Neural Crest Cells"}})
RETURN p.text, t.name
ORDER BY t.name
LIMIT 3
```

2. Detailed explanation of a specific term:
```cypher
MATCH (p:Paragraph)-[:MENTIONS]->(t:Topic)
WHERE t.name CONTAINS "neurulation"
RETURN p.text AS explanation
ORDER BY t.name
LIMIT 3
```

3. Paragraphs mentioning several topics at once:
```cypher
MATCH (p:Paragraph)-[:MENTIONS]->(t1:Topic {{name: "Neural Crest Cells"}})
MATCH (p)-[:MENTIONS]->(t2:Topic {{name: "Skeletal Formation"}})
RETURN p.text AS relevant_paragraph
```

4. Course structure lookups:
```cypher
MATCH (c:Course)-[:HAS_MODULE]->(m:Module)-[:HAS_LESSON]->(l:Lesson)
WHERE c.name = "Embryology"
RETURN m.name, l.name
```

Question: {utterance}"#
    )
}

/// Prompt listing the capabilities for the LLM-backed selection policy.
pub fn build_selection_prompt(utterance: &str, capabilities: &[(String, String)]) -> String {
    let mut prompt = String::from("Capabilities:\n");
    for (name, description) in capabilities {
        prompt.push_str(&format!("- {name}: {description}\n"));
    }
    prompt.push_str(&format!("\nQuestion: {utterance}\n\nCapability name:"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str) -> ScoredPassage {
        ScoredPassage {
            text: text.to_string(),
            score: 0.9,
            course: Some("Embryology".into()),
            module: None,
            lesson: Some("Neurulation".into()),
            topics: vec!["Neural Crest Cells".into()],
        }
    }

    #[test]
    fn system_prompts_forbid_fabrication() {
        assert!(GENERAL_CHAT_SYSTEM_PROMPT.contains("pre-trained knowledge"));
        assert!(RAG_SYSTEM_PROMPT.contains("I don't know"));
        assert!(CYPHER_SYSTEM_PROMPT.contains("Only generate read queries"));
    }

    #[test]
    fn rag_prompt_contains_passages_and_metadata() {
        let passages = vec![passage("The neural crest gives rise to melanocytes.")];
        let prompt = build_rag_prompt("What is the neural crest?", &passages, &[]);

        assert!(prompt.contains("melanocytes"));
        assert!(prompt.contains("course: Embryology"));
        assert!(prompt.contains("topics: Neural Crest Cells"));
        assert!(prompt.contains("What is the neural crest?"));
    }

    #[test]
    fn history_block_keeps_last_four_turns() {
        let history: Vec<Message> = (0..6)
            .map(|i| Message::user(format!("question {i}")))
            .collect();
        let block = history_block(&history);

        assert!(!block.contains("question 0"));
        assert!(!block.contains("question 1"));
        assert!(block.contains("question 2"));
        assert!(block.contains("question 5"));
    }

    #[test]
    fn prompt_without_history_has_no_history_tag() {
        let prompt = build_general_chat_prompt("First question", &[]);
        assert!(!prompt.contains("CONVERSATION_HISTORY"));
    }

    #[test]
    fn cypher_prompt_carries_schema_and_question() {
        let prompt = build_cypher_prompt("Which lessons are in the Embryology course?");
        assert!(prompt.contains("HAS_MODULE"));
        assert!(prompt.contains(":Paragraph"));
        assert!(prompt.contains("Which lessons are in the Embryology course?"));
    }

    #[test]
    fn selection_prompt_lists_capabilities() {
        let capabilities = vec![
            ("General Chat".to_string(), "general chat".to_string()),
            ("Course Paragraph Search".to_string(), "similarity search".to_string()),
        ];
        let prompt = build_selection_prompt("hello", &capabilities);
        assert!(prompt.contains("- General Chat: general chat"));
        assert!(prompt.contains("Question: hello"));
    }
}
