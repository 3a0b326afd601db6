use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lectern::agent::cypher_qa::CypherQa;
use lectern::agent::general_chat::GeneralChat;
use lectern::agent::paragraph_search::ParagraphSearch;
use lectern::agent::policy::{KeywordSelectionPolicy, LlmSelectionPolicy, SelectionPolicy};
use lectern::agent::{Capability, CapabilityRouter};
use lectern::api::{api_router, ApiContext};
use lectern::config::{SelectionPolicyKind, Settings, APP_NAME, APP_VERSION};
use lectern::db::sqlite::open_database;
use lectern::graph::client::Neo4jHttpClient;
use lectern::llm::ollama::OllamaClient;
use lectern::session::SqliteHistoryStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(lectern::config::default_log_filter())),
        )
        .init();

    tracing::info!("{APP_NAME} starting v{APP_VERSION}");

    if let Err(e) = serve(Settings::from_env()).await {
        tracing::error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&settings.data_dir)?;
    let conn = open_database(&settings.database_path())?;
    let history = Arc::new(SqliteHistoryStore::new(conn));

    let ollama = Arc::new(OllamaClient::new(
        &settings.ollama_url,
        &settings.chat_model,
        &settings.embedding_model,
        settings.ollama_timeout_secs,
    )?);
    // Startup probe only; a missing model is reported per turn as an apology.
    let probe = ollama.clone();
    match tokio::task::spawn_blocking(move || probe.list_models()).await? {
        Ok(models) => {
            if !models.iter().any(|m| m == ollama.chat_model()) {
                tracing::warn!(
                    model = ollama.chat_model(),
                    "chat model not found on the Ollama instance"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "Ollama unreachable at startup"),
    }

    let neo4j = Arc::new(Neo4jHttpClient::new(
        &settings.neo4j_url,
        &settings.neo4j_database,
        &settings.neo4j_user,
        &settings.neo4j_password,
        &settings.vector_index,
        settings.neo4j_timeout_secs,
    )?);

    // General chat first: it is the router's fallback.
    let capabilities: Vec<Box<dyn Capability>> = vec![
        Box::new(GeneralChat::new(ollama.clone())),
        Box::new(ParagraphSearch::new(
            ollama.clone(),
            neo4j.clone(),
            ollama.clone(),
            settings.top_k,
            settings.min_score,
        )),
        Box::new(CypherQa::new(ollama.clone(), neo4j)),
    ];

    let policy: Box<dyn SelectionPolicy> = match settings.selection_policy {
        SelectionPolicyKind::Llm => Box::new(LlmSelectionPolicy::new(ollama)),
        SelectionPolicyKind::Keyword => Box::new(KeywordSelectionPolicy),
    };

    let agent = Arc::new(CapabilityRouter::new(capabilities, policy, history));
    let app = api_router(ApiContext::new(agent));

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
