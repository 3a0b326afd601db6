pub mod client;
pub mod schema;
pub mod vector;

pub use client::Neo4jHttpClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j connection failed: {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Neo4j returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Neo4j query failed ({code}): {message}")]
    Query { code: String, message: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generated query violates the course schema: {0}")]
    SchemaViolation(String),
}

/// Tabular result of a read-only graph query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Structured query collaborator: executes a schema-constrained Cypher
/// query and returns result rows.
pub trait GraphQuery: Send + Sync {
    fn run(&self, cypher: &str) -> Result<QueryResult, GraphError>;
}

/// A course paragraph with its similarity score and graph metadata.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f32,
    pub course: Option<String>,
    pub module: Option<String>,
    pub lesson: Option<String>,
    pub topics: Vec<String>,
}

/// Content retrieval collaborator: query embedding → top-K most similar
/// paragraphs, best first.
pub trait PassageSearch: Send + Sync {
    fn search(&self, query_embedding: &[f32], top_k: usize)
        -> Result<Vec<ScoredPassage>, GraphError>;
}
