use async_trait::async_trait;
use finquery_core::{FinQueryError, FinQueryResult};
use tracing::debug;

use crate::config::{ModelConfig, ModelProvider};

/// Trait for computing text embeddings (vector representations).
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> FinQueryResult<Vec<f32>>;
}

/// Trait for single-turn text completions.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete a prompt. An empty completion is a valid result, not an
    /// error.
    async fn complete(&self, prompt: &str) -> FinQueryResult<String>;
}

/// Client for OpenAI-compatible embedding and chat-completion APIs.
///
/// Works with OpenAI, OpenRouter, Groq, and any other provider that
/// implements the OpenAI wire format. One instance serves both the
/// ingestion path (embeddings) and the answering path (completions).
pub struct OpenAiClient {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> FinQueryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FinQueryError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, ModelProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "https://github.com/finquery/finquery")
                .header("X-Title", "FinQuery")
        } else {
            request
        }
    }

    fn map_transport_error(e: reqwest::Error) -> FinQueryError {
        if e.is_timeout() {
            FinQueryError::Timeout(format!("Model call timed out: {e}"))
        } else {
            FinQueryError::Model(e.to_string())
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> FinQueryResult<serde_json::Value> {
        let request = self.add_provider_headers(self.http.post(url));

        let resp = request
            .json(body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = resp.status();
        let resp_body: serde_json::Value =
            resp.json().await.map_err(Self::map_transport_error)?;

        if !status.is_success() {
            return Err(FinQueryError::Model(format!(
                "API error {status}: {resp_body}"
            )));
        }

        Ok(resp_body)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn embed(&self, text: &str) -> FinQueryResult<Vec<f32>> {
        if text.is_empty() {
            return Err(FinQueryError::Model("Cannot embed empty text".to_string()));
        }

        let url = format!("{}/v1/embeddings", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.embedding_model_id,
            "input": text,
        });

        let resp = self.post_json(&url, &body).await?;

        let vector: Vec<f32> = resp["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| {
                FinQueryError::Model("Embedding response missing data[0].embedding".to_string())
            })?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if vector.is_empty() {
            return Err(FinQueryError::Model(
                "Embedding response contained an empty vector".to_string(),
            ));
        }

        debug!(dimension = vector.len(), "Embedding computed");
        Ok(vector)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> FinQueryResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self.post_json(&url, &body).await?;

        // A missing or null content field is a valid empty completion.
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}
