//! Core types and error definitions for the FinQuery pipeline.
//!
//! This crate provides the foundational types shared across all FinQuery
//! crates: the unified error enum and the document-chunk data model that
//! the ingestion and retrieval paths exchange.
//!
//! # Main types
//!
//! - [`FinQueryError`] — Unified error enum for all FinQuery subsystems.
//! - [`FinQueryResult`] — Convenience alias for `Result<T, FinQueryError>`.
//! - [`DocumentChunk`] — A bounded span of document text, the unit of
//!   storage and retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Error types ---

/// Top-level error type for the FinQuery pipeline.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum FinQueryError {
    /// An error from the content store (connection, constraint, query).
    #[error("Store error: {0}")]
    Store(String),

    /// An error from the language-model service (embeddings or completions).
    #[error("Model error: {0}")]
    Model(String),

    /// An error during document ingestion (extraction, chunking).
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// An error in the retrieval path (invalid query or limit).
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An outbound call exceeded its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FinQueryError`].
pub type FinQueryResult<T> = Result<T, FinQueryError>;

// --- Data model ---

/// A bounded span of document text, the unit of storage and retrieval.
///
/// Chunks are created once during ingestion by windowing document text
/// and are only ever read afterwards; there is no update path. The
/// embedding is either fully populated or absent — a present but empty
/// vector is invalid and rejected by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique identifier for this chunk.
    pub id: Uuid,
    /// The text content of the chunk. Never empty or whitespace-only
    /// once stored.
    pub content: String,
    /// Fixed-dimension embedding vector, or `None` when embedding
    /// generation was skipped.
    pub embedding: Option<Vec<f32>>,
    /// UTC timestamp of when the chunk was created.
    pub created_at: DateTime<Utc>,
}

impl DocumentChunk {
    /// Creates a new chunk with a fresh id and the current timestamp.
    pub fn new(content: impl Into<String>, embedding: Option<Vec<f32>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            embedding,
            created_at: Utc::now(),
        }
    }

    /// Whether this chunk carries an embedding vector.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}
