use std::sync::Arc;

use finquery_core::{DocumentChunk, FinQueryError, FinQueryResult};
use finquery_model::EmbeddingClient;
use finquery_store::StorePool;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::chunker::{window_text, ChunkingConfig};
use crate::source::DocumentSource;

/// Upper bound on in-flight embedding calls during one ingestion run.
/// The stream is ordered, so the writer still commits chunks in
/// chunking order.
pub const EMBED_CONCURRENCY: usize = 4;

/// Outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Human-readable summary, suitable for the caller-facing surface.
    pub message: String,
    pub chunks_stored: usize,
    pub documents_read: usize,
    pub documents_skipped: usize,
}

/// Drives one ingestion pass: extract every document, window the text,
/// embed the retained chunks when a client is configured, and insert
/// them into the store in order.
pub struct Ingestor {
    source: Arc<dyn DocumentSource>,
    pool: Arc<StorePool>,
    embedder: Option<Arc<dyn EmbeddingClient>>,
    config: ChunkingConfig,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        pool: Arc<StorePool>,
        embedder: Option<Arc<dyn EmbeddingClient>>,
        config: ChunkingConfig,
    ) -> Self {
        Self {
            source,
            pool,
            embedder,
            config,
        }
    }

    /// Run one ingestion pass.
    ///
    /// A missing source location is a report message, not an error. A
    /// document that fails extraction is skipped and counted; store and
    /// embedding failures abort the run.
    pub async fn run(&self) -> FinQueryResult<IngestReport> {
        if !self.source.available() {
            let message = format!("Document directory not found at {}", self.source.location());
            warn!(location = %self.source.location(), "Ingestion skipped");
            return Ok(IngestReport {
                message,
                chunks_stored: 0,
                documents_read: 0,
                documents_skipped: 0,
            });
        }

        let documents = self.source.list_documents().await?;
        info!(count = documents.len(), "Documents discovered");

        // One shared buffer across the corpus: pages are delimited by a
        // newline so windows can cross page (and document) boundaries
        // without losing page order.
        let mut buffer = String::new();
        let mut documents_read = 0usize;
        let mut documents_skipped = 0usize;

        for name in &documents {
            match self.source.extract_pages(name).await {
                Ok(pages) => {
                    for page in &pages {
                        buffer.push_str(page);
                        buffer.push('\n');
                    }
                    documents_read += 1;
                }
                Err(e) => {
                    warn!(document = %name, error = %e, "Skipping unreadable document");
                    documents_skipped += 1;
                }
            }
        }

        let retained: Vec<String> = window_text(&buffer, &self.config)
            .into_iter()
            .filter(|w| !w.trim().is_empty())
            .collect();

        let chunks = self.embed_chunks(retained).await?;

        let conn = self.pool.checkout().await?;
        let mut chunks_stored = 0usize;
        for chunk in chunks {
            conn.insert_chunk(chunk).await?;
            chunks_stored += 1;
        }

        let mut message = if self.embedder.is_some() {
            format!("Stored {chunks_stored} chunks")
        } else {
            format!("Stored {chunks_stored} chunks (embeddings pending)")
        };
        if documents_skipped > 0 {
            message.push_str(&format!(", skipped {documents_skipped} unreadable documents"));
        }

        info!(
            chunks_stored,
            documents_read, documents_skipped, "Ingestion run complete"
        );

        Ok(IngestReport {
            message,
            chunks_stored,
            documents_read,
            documents_skipped,
        })
    }

    /// Turn retained windows into chunks, embedding them with bounded
    /// concurrency when a client is configured. The `buffered` stream
    /// yields results in input order.
    async fn embed_chunks(&self, retained: Vec<String>) -> FinQueryResult<Vec<DocumentChunk>> {
        match &self.embedder {
            Some(embedder) => {
                stream::iter(retained.into_iter().map(|content| {
                    let embedder = Arc::clone(embedder);
                    async move {
                        let vector = embedder.embed(&content).await?;
                        Ok::<_, FinQueryError>(DocumentChunk::new(content, Some(vector)))
                    }
                }))
                .buffered(EMBED_CONCURRENCY)
                .try_collect()
                .await
            }
            None => Ok(retained
                .into_iter()
                .map(|content| DocumentChunk::new(content, None))
                .collect()),
        }
    }
}
