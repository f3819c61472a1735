use serde::{Deserialize, Serialize};

/// Language-model providers. All speak the OpenAI-compatible wire
/// format for chat completions and embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAi,
    OpenRouter,
    /// Groq cloud inference — OpenAI-compatible API, free tier with rate limits.
    Groq,
}

/// Configuration for the language-model client.
///
/// The presence of this config is what enables model-backed answering;
/// its absence is the first-class degraded mode, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    /// Chat-completion model, e.g. "gpt-4o-mini".
    pub model_id: String,
    /// Embedding model, e.g. "text-embedding-3-small".
    #[serde(default = "default_embedding_model")]
    pub embedding_model_id: String,
    pub api_key: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Deadline for a single outbound call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

impl ModelConfig {
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                ModelProvider::OpenAi => "https://api.openai.com",
                ModelProvider::OpenRouter => "https://openrouter.ai/api",
                ModelProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }
}
