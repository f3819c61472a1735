pub mod client;
pub mod config;

pub use client::{CompletionClient, EmbeddingClient, OpenAiClient};
pub use config::{ModelConfig, ModelProvider};
