use serde::{Deserialize, Serialize};

use super::{Embedder, LlmError, TextGenerator};

/// Ollama HTTP client for local LLM inference and query embeddings.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    chat_model: String,
    embedding_model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(
        base_url: &str,
        chat_model: &str,
        embedding_model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
            timeout_secs,
        })
    }

    /// The chat model name being used.
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// List models available on the Ollama instance.
    pub fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            LlmError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            LlmError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Request body for Ollama /api/embeddings
#[derive(Serialize)]
struct OllamaEmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body from Ollama /api/embeddings
#[derive(Deserialize)]
struct OllamaEmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl TextGenerator for OllamaClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.chat_model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

impl Embedder for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = OllamaEmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaEmbeddingsResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.embedding)
    }
}

/// Scripted LLM for testing — returns queued responses in order, repeating
/// the last one once the script runs out.
pub struct ScriptedLlm {
    responses: std::sync::Mutex<Vec<String>>,
    /// Prompts seen by `generate`, for assertions.
    pub seen: std::sync::Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new(response: &str) -> Self {
        Self::with_script(vec![response.to_string()])
    }

    pub fn with_script(responses: Vec<String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for ScriptedLlm {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.seen
            .lock()
            .map_err(|_| LlmError::HttpClient("lock poisoned".into()))?
            .push((system.to_string(), prompt.to_string()));

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::HttpClient("lock poisoned".into()))?;
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            responses
                .first()
                .cloned()
                .ok_or_else(|| LlmError::ResponseParsing("script exhausted".into()))
        }
    }
}

impl Embedder for ScriptedLlm {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}
