use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::graph::schema::validate_cypher;
use crate::graph::{GraphQuery, QueryResult};
use crate::llm::TextGenerator;
use crate::models::Message;

use super::capability::{Capability, STRUCTURED_QUERY};
use super::prompt::{build_cypher_prompt, no_rows_response, CYPHER_SYSTEM_PROMPT};
use super::AgentError;

/// Structured query capability: translate the question into a Cypher
/// query constrained to the fixed course schema, execute it, and return
/// the result rows as text. Generated queries are validated before they
/// touch the database.
pub struct CypherQa {
    generator: Arc<dyn TextGenerator>,
    graph: Arc<dyn GraphQuery>,
}

impl CypherQa {
    pub fn new(generator: Arc<dyn TextGenerator>, graph: Arc<dyn GraphQuery>) -> Self {
        Self { generator, graph }
    }
}

impl Capability for CypherQa {
    fn name(&self) -> &'static str {
        STRUCTURED_QUERY
    }

    fn description(&self) -> &'static str {
        "For structured fact lookups about courses, modules, lessons and topics"
    }

    fn handle(&self, utterance: &str, _history: &[Message]) -> Result<String, AgentError> {
        let prompt = build_cypher_prompt(utterance);
        let raw = self.generator.generate(CYPHER_SYSTEM_PROMPT, &prompt)?;

        let cypher = extract_cypher(&raw);
        validate_cypher(&cypher).map_err(AgentError::Graph)?;
        tracing::debug!(cypher = %cypher, "generated course query");

        let result = self.graph.run(&cypher)?;
        if result.is_empty() {
            return Ok(no_rows_response());
        }
        Ok(format_rows(&result))
    }
}

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:cypher)?\s*(.*?)```").expect("valid fence regex")
    })
}

/// Pull the Cypher out of a fenced block if the model used one,
/// otherwise take the whole reply.
fn extract_cypher(raw: &str) -> String {
    match fence_pattern().captures(raw) {
        Some(cap) => cap[1].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Render result rows as "column: value" lines, one block per row.
fn format_rows(result: &QueryResult) -> String {
    let mut out = String::new();
    for (i, row) in result.rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (column, value) in result.columns.iter().zip(row.iter()) {
            out.push_str(&format!("{}: {}\n", column, render_value(value)));
        }
    }
    out.trim_end().to_string()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;
    use crate::llm::ollama::ScriptedLlm;
    use serde_json::json;
    use std::sync::Mutex;

    /// Mock graph that records queries and returns canned rows.
    struct MockGraph {
        result: QueryResult,
        queries: Mutex<Vec<String>>,
    }

    impl MockGraph {
        fn with_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
            Self {
                result: QueryResult {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows,
                },
                queries: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self::with_rows(&[], vec![])
        }
    }

    impl GraphQuery for MockGraph {
        fn run(&self, cypher: &str) -> Result<QueryResult, GraphError> {
            self.queries.lock().unwrap().push(cypher.to_string());
            Ok(self.result.clone())
        }
    }

    #[test]
    fn extracts_fenced_cypher() {
        let raw = "Here you go:\n```cypher\nMATCH (c:Course) RETURN c.name\n```\nDone.";
        assert_eq!(extract_cypher(raw), "MATCH (c:Course) RETURN c.name");
    }

    #[test]
    fn extracts_plain_fence_and_bare_reply() {
        assert_eq!(
            extract_cypher("```\nMATCH (c:Course) RETURN c.name\n```"),
            "MATCH (c:Course) RETURN c.name"
        );
        assert_eq!(
            extract_cypher("  MATCH (c:Course) RETURN c.name  "),
            "MATCH (c:Course) RETURN c.name"
        );
    }

    #[test]
    fn runs_validated_query_and_formats_rows() {
        let llm = Arc::new(ScriptedLlm::new(
            "```cypher\nMATCH (c:Course)-[:HAS_MODULE]->(m:Module) RETURN c.name, m.name\n```",
        ));
        let graph = Arc::new(MockGraph::with_rows(
            &["c.name", "m.name"],
            vec![
                vec![json!("Embryology"), json!("Week 1")],
                vec![json!("Embryology"), json!("Week 2")],
            ],
        ));
        let capability = CypherQa::new(llm, graph.clone());

        let reply = capability
            .handle("Which modules does Embryology have?", &[])
            .unwrap();
        assert!(reply.contains("c.name: Embryology"));
        assert!(reply.contains("m.name: Week 2"));

        let queries = graph.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].starts_with("MATCH"));
    }

    #[test]
    fn schema_violation_never_reaches_the_database() {
        let llm = Arc::new(ScriptedLlm::new(
            "```cypher\nMATCH (p:Person) RETURN p.name\n```",
        ));
        let graph = Arc::new(MockGraph::empty());
        let capability = CypherQa::new(llm, graph.clone());

        let err = capability.handle("Who teaches?", &[]).unwrap_err();
        assert!(matches!(err, AgentError::Graph(GraphError::SchemaViolation(_))));
        assert!(graph.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn write_query_is_rejected() {
        let llm = Arc::new(ScriptedLlm::new("CREATE (c:Course {name: 'x'}) RETURN c"));
        let graph = Arc::new(MockGraph::empty());
        let capability = CypherQa::new(llm, graph.clone());

        assert!(capability.handle("add a course", &[]).is_err());
        assert!(graph.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_result_reports_no_rows() {
        let llm = Arc::new(ScriptedLlm::new("MATCH (c:Course) RETURN c.name"));
        let graph = Arc::new(MockGraph::empty());
        let capability = CypherQa::new(llm, graph);

        let reply = capability.handle("Which courses exist?", &[]).unwrap();
        assert!(reply.contains("didn't find anything"));
    }

    #[test]
    fn render_value_flattens_strings_arrays_and_null() {
        assert_eq!(render_value(&json!("plain")), "plain");
        assert_eq!(render_value(&json!(["a", "b"])), "a, b");
        assert_eq!(render_value(&json!(null)), "-");
        assert_eq!(render_value(&json!(3)), "3");
    }
}
