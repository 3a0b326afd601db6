use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{GraphError, GraphQuery, PassageSearch, QueryResult, ScoredPassage};

/// Vector index lookup with the course/module/lesson/topic projection.
/// Walks the containment chain back from each matched paragraph so the
/// caller gets display metadata alongside text and score.
const PASSAGE_QUERY: &str = "\
CALL db.index.vector.queryNodes($index, $k, $embedding)
YIELD node, score
RETURN node.text AS text,
       score,
       [ (c:Course)-[:HAS_MODULE]->(:Module)-[:HAS_LESSON]->(:Lesson)-[:CONTAINS]->(node) | c.name ][0] AS course,
       [ (m:Module)-[:HAS_LESSON]->(:Lesson)-[:CONTAINS]->(node) | m.name ][0] AS module,
       [ (l:Lesson)-[:CONTAINS]->(node) | l.name ][0] AS lesson,
       [ (node)-[:MENTIONS]->(t:Topic) | t.name ] AS topics
ORDER BY score DESC";

/// Neo4j HTTP client speaking the transactional commit endpoint.
pub struct Neo4jHttpClient {
    base_url: String,
    database: String,
    username: String,
    password: String,
    vector_index: String,
    client: reqwest::blocking::Client,
}

impl Neo4jHttpClient {
    pub fn new(
        base_url: &str,
        database: &str,
        username: &str,
        password: &str,
        vector_index: &str,
        timeout_secs: u64,
    ) -> Result<Self, GraphError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GraphError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            vector_index: vector_index.to_string(),
            client,
        })
    }

    fn execute(&self, statement: &str, parameters: Value) -> Result<QueryResult, GraphError> {
        let url = format!("{}/db/{}/tx/commit", self.base_url, self.database);
        let body = Neo4jRequest {
            statements: vec![Neo4jStatement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GraphError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    GraphError::HttpClient("Neo4j request timed out".into())
                } else {
                    GraphError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GraphError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Neo4jResponse = response
            .json()
            .map_err(|e| GraphError::ResponseParsing(e.to_string()))?;

        if let Some(err) = parsed.errors.first() {
            return Err(GraphError::Query {
                code: err.code.clone(),
                message: err.message.clone(),
            });
        }

        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::ResponseParsing("empty results array".into()))?;

        Ok(QueryResult {
            columns: result.columns,
            rows: result.data.into_iter().map(|d| d.row).collect(),
        })
    }
}

#[derive(Serialize)]
struct Neo4jRequest<'a> {
    statements: Vec<Neo4jStatement<'a>>,
}

#[derive(Serialize)]
struct Neo4jStatement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Deserialize)]
struct Neo4jResponse {
    results: Vec<Neo4jResult>,
    #[serde(default)]
    errors: Vec<Neo4jErrorBody>,
}

#[derive(Deserialize)]
struct Neo4jResult {
    columns: Vec<String>,
    data: Vec<Neo4jRow>,
}

#[derive(Deserialize)]
struct Neo4jRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct Neo4jErrorBody {
    code: String,
    message: String,
}

impl GraphQuery for Neo4jHttpClient {
    fn run(&self, cypher: &str) -> Result<QueryResult, GraphError> {
        tracing::debug!(cypher, "executing graph query");
        self.execute(cypher, json!({}))
    }
}

impl PassageSearch for Neo4jHttpClient {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, GraphError> {
        let result = self.execute(
            PASSAGE_QUERY,
            json!({
                "index": self.vector_index,
                "k": top_k,
                "embedding": query_embedding,
            }),
        )?;

        result.rows.iter().map(passage_from_row).collect()
    }
}

fn passage_from_row(row: &Vec<Value>) -> Result<ScoredPassage, GraphError> {
    let text = row
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| GraphError::ResponseParsing("passage row missing text".into()))?
        .to_string();
    let score = row
        .get(1)
        .and_then(Value::as_f64)
        .ok_or_else(|| GraphError::ResponseParsing("passage row missing score".into()))?
        as f32;

    let name_at = |idx: usize| {
        row.get(idx)
            .and_then(Value::as_str)
            .map(|s| s.to_string())
    };

    let topics = row
        .get(5)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(ScoredPassage {
        text,
        score,
        course: name_at(2),
        module: name_at(3),
        lesson: name_at(4),
        topics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passage_query_is_schema_conforming() {
        assert!(crate::graph::schema::validate_cypher(PASSAGE_QUERY).is_ok());
    }

    #[test]
    fn passage_from_row_maps_all_fields() {
        let row = vec![
            json!("The neural crest gives rise to..."),
            json!(0.91),
            json!("Embryology"),
            json!("Week 3"),
            json!("Neurulation"),
            json!(["Neural Crest Cells", "Skeletal Formation"]),
        ];
        let passage = passage_from_row(&row).unwrap();
        assert_eq!(passage.score, 0.91);
        assert_eq!(passage.course.as_deref(), Some("Embryology"));
        assert_eq!(passage.topics.len(), 2);
    }

    #[test]
    fn passage_from_row_tolerates_null_metadata() {
        let row = vec![json!("text"), json!(0.8), json!(null), json!(null), json!(null), json!(null)];
        let passage = passage_from_row(&row).unwrap();
        assert!(passage.course.is_none());
        assert!(passage.topics.is_empty());
    }

    #[test]
    fn passage_from_row_rejects_missing_text() {
        let row = vec![json!(null), json!(0.8)];
        assert!(passage_from_row(&row).is_err());
    }
}
