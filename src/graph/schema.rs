//! The fixed course schema and validation of generated Cypher.
//!
//! The translation capability must never emit queries outside this
//! schema, and never anything that writes. Validation runs on every
//! generated query before execution.

use regex::Regex;
use std::sync::OnceLock;

use super::GraphError;

/// Node labels the course graph exposes.
pub const NODE_LABELS: &[&str] = &["Course", "Module", "Lesson", "Topic", "Paragraph"];

/// Relationship types the course graph exposes.
pub const RELATIONSHIP_TYPES: &[&str] = &["CONTAINS", "MENTIONS", "HAS_MODULE", "HAS_LESSON"];

/// Procedures a generated query may CALL. Vector lookups are part of the
/// original example queries, so the paragraph index procedure is allowed.
const ALLOWED_PROCEDURES: &[&str] = &["db.index.vector.queryNodes"];

/// Clauses that would mutate the graph. Generated queries are read-only.
const WRITE_CLAUSES: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "FOREACH", "LOAD",
];

/// Human-readable schema description interpolated into the Cypher
/// generation prompt.
pub const SCHEMA_TEXT: &str = "\
Nodes:
  (:Course {name})
  (:Module {name})
  (:Lesson {name})
  (:Topic {name})
  (:Paragraph {text, embedding})

Relationships:
  (:Course)-[:HAS_MODULE]->(:Module)
  (:Module)-[:HAS_LESSON]->(:Lesson)
  (:Lesson)-[:CONTAINS]->(:Paragraph)
  (:Paragraph)-[:MENTIONS]->(:Topic)";

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(\s*[A-Za-z0-9_]*\s*:\s*([A-Za-z0-9_]+)").expect("valid label regex")
    })
}

fn relationship_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\s*[A-Za-z0-9_]*\s*:\s*([A-Za-z0-9_]+)").expect("valid relationship regex")
    })
}

fn write_clause_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives = WRITE_CLAUSES.join("|");
        Regex::new(&format!(r"(?i)\b({alternatives})\b")).expect("valid clause regex")
    })
}

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bCALL\s+([A-Za-z0-9_.]+)").expect("valid call regex"))
}

/// Check a generated Cypher query against the fixed course schema.
///
/// Rejects write clauses, unknown node labels, unknown relationship
/// types, and procedure calls outside the allowlist. Conservative by
/// construction: a query rejected here is never sent to the database.
pub fn validate_cypher(query: &str) -> Result<(), GraphError> {
    if let Some(m) = write_clause_pattern().find(query) {
        return Err(GraphError::SchemaViolation(format!(
            "write clause {} is not allowed",
            m.as_str().to_uppercase()
        )));
    }

    for cap in label_pattern().captures_iter(query) {
        let label = &cap[1];
        if !NODE_LABELS.contains(&label) {
            return Err(GraphError::SchemaViolation(format!(
                "unknown node label {label}"
            )));
        }
    }

    for cap in relationship_pattern().captures_iter(query) {
        let rel = &cap[1];
        if !RELATIONSHIP_TYPES.contains(&rel) {
            return Err(GraphError::SchemaViolation(format!(
                "unknown relationship type {rel}"
            )));
        }
    }

    for cap in call_pattern().captures_iter(query) {
        let procedure = &cap[1];
        if !ALLOWED_PROCEDURES.contains(&procedure) {
            return Err(GraphError::SchemaViolation(format!(
                "procedure {procedure} is not allowed"
            )));
        }
    }

    Ok(())
}
