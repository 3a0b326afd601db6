//! Runtime settings, read once from the environment at startup.

use std::env;
use std::path::PathBuf;

pub const APP_NAME: &str = "Lectern";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DATABASE_FILE: &str = "lectern.db";

/// Which selection policy decides the capability for each utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicyKind {
    Llm,
    Keyword,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub ollama_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub ollama_timeout_secs: u64,
    pub neo4j_url: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: String,
    pub neo4j_timeout_secs: u64,
    pub vector_index: String,
    pub top_k: usize,
    pub min_score: f32,
    pub selection_policy: SelectionPolicyKind,
    pub data_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);

        Self {
            bind_addr: env_or("LECTERN_BIND", "127.0.0.1:8787"),
            ollama_url: env_or("LECTERN_OLLAMA_URL", "http://localhost:11434"),
            chat_model: env_or("LECTERN_CHAT_MODEL", "llama3.1:8b"),
            embedding_model: env_or("LECTERN_EMBEDDING_MODEL", "nomic-embed-text"),
            ollama_timeout_secs: env_or("LECTERN_OLLAMA_TIMEOUT_SECS", "300")
                .parse()
                .unwrap_or(300),
            neo4j_url: env_or("LECTERN_NEO4J_URL", "http://localhost:7474"),
            neo4j_user: env_or("LECTERN_NEO4J_USER", "neo4j"),
            neo4j_password: env_or("LECTERN_NEO4J_PASSWORD", "neo4j"),
            neo4j_database: env_or("LECTERN_NEO4J_DATABASE", "neo4j"),
            neo4j_timeout_secs: env_or("LECTERN_NEO4J_TIMEOUT_SECS", "30")
                .parse()
                .unwrap_or(30),
            vector_index: env_or("LECTERN_VECTOR_INDEX", "Paragraph_embeddings"),
            top_k: env_or("LECTERN_TOP_K", "5").parse().unwrap_or(5),
            min_score: env_or("LECTERN_MIN_SCORE", "0.7").parse().unwrap_or(0.7),
            selection_policy: parse_policy(&env_or("LECTERN_SELECTION_POLICY", "llm")),
            data_dir,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

pub fn default_log_filter() -> String {
    "lectern=debug,info".to_string()
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_policy(value: &str) -> SelectionPolicyKind {
    match value.to_lowercase().as_str() {
        "keyword" => SelectionPolicyKind::Keyword,
        "llm" => SelectionPolicyKind::Llm,
        other => {
            tracing::warn!(value = other, "unknown selection policy; using llm");
            SelectionPolicyKind::Llm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::from_env();
        assert!(settings.ollama_url.starts_with("http"));
        assert!(settings.neo4j_url.starts_with("http"));
        assert_eq!(settings.vector_index, "Paragraph_embeddings");
        assert_eq!(settings.ollama_timeout_secs, 300);
        assert_eq!(settings.neo4j_timeout_secs, 30);
        assert_eq!(settings.top_k, 5);
        assert!((settings.min_score - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn database_path_lives_in_data_dir() {
        let settings = Settings::from_env();
        assert!(settings.database_path().ends_with("lectern.db"));
        assert!(settings.database_path().starts_with(&settings.data_dir));
    }

    #[test]
    fn policy_parsing_accepts_both_kinds() {
        assert_eq!(parse_policy("keyword"), SelectionPolicyKind::Keyword);
        assert_eq!(parse_policy("LLM"), SelectionPolicyKind::Llm);
        assert_eq!(parse_policy("garbage"), SelectionPolicyKind::Llm);
    }
}
