use std::sync::Arc;

use finquery_core::{FinQueryError, FinQueryResult};
use finquery_model::EmbeddingClient;
use finquery_store::StorePool;
use tracing::debug;

/// Default number of chunks returned by a retrieval.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Which tier produced (or last attempted to produce) the result.
///
/// The resolution order is fixed: the lexical tier is always attempted
/// first, and the vector tier only runs on a lexical miss. Exposing the
/// tier makes the fallback transition a testable contract instead of
/// implicit control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTier {
    Lexical,
    Vector,
}

/// An ordered retrieval result.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub chunks: Vec<String>,
    pub tier: RetrievalTier,
}

/// Resolves a query to an ordered list of chunk contents.
///
/// Tier 1 matches the query as a case-insensitive substring in store
/// order. Tier 2 embeds the query itself and ranks stored chunks by
/// ascending distance to that reference; it is only reachable when the
/// lexical tier returns nothing. Without an embedding client the vector
/// tier resolves to an empty list — degraded, not an error.
#[derive(Clone)]
pub struct Retriever {
    pool: Arc<StorePool>,
    embedder: Option<Arc<dyn EmbeddingClient>>,
}

impl Retriever {
    pub fn new(pool: Arc<StorePool>, embedder: Option<Arc<dyn EmbeddingClient>>) -> Self {
        Self { pool, embedder }
    }

    /// Retrieve up to `limit` chunk contents relevant to `query`.
    pub async fn retrieve(&self, query: &str, limit: usize) -> FinQueryResult<Retrieval> {
        if query.trim().is_empty() {
            return Err(FinQueryError::Retrieval(
                "Query must not be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Err(FinQueryError::Retrieval(
                "Limit must be positive".to_string(),
            ));
        }

        let conn = self.pool.checkout().await?;

        let hits = conn.query_lexical(query, limit).await?;
        if !hits.is_empty() {
            debug!(count = hits.len(), "Lexical tier hit");
            return Ok(Retrieval {
                chunks: hits,
                tier: RetrievalTier::Lexical,
            });
        }

        // Lexical miss: fall back to vector similarity. The reference
        // embedding is always derived from the query itself.
        let Some(embedder) = &self.embedder else {
            debug!("Vector tier unavailable without an embedding client");
            return Ok(Retrieval {
                chunks: Vec::new(),
                tier: RetrievalTier::Vector,
            });
        };

        let reference = embedder.embed(query).await?;
        let chunks = conn.query_nearest(&reference, limit).await?;
        debug!(count = chunks.len(), "Vector tier result");

        Ok(Retrieval {
            chunks,
            tier: RetrievalTier::Vector,
        })
    }
}
