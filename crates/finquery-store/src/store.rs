use async_trait::async_trait;
use finquery_core::{DocumentChunk, FinQueryError, FinQueryResult};
use tokio::sync::RwLock;

/// Trait for content-store backends.
///
/// Chunks are append-only: they are inserted once during ingestion and
/// only ever read afterwards. Insertion order is preserved and is the
/// order [`query_lexical`](ContentStore::query_lexical) returns matches in.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a chunk. Fails on blank content or a present-but-empty
    /// embedding vector.
    async fn insert_chunk(&self, chunk: DocumentChunk) -> FinQueryResult<()>;

    /// Return up to `limit` chunk contents containing `pattern` as a
    /// case-insensitive substring, in insertion order.
    async fn query_lexical(&self, pattern: &str, limit: usize) -> FinQueryResult<Vec<String>>;

    /// Return up to `limit` chunk contents ordered by ascending Euclidean
    /// distance between each chunk's embedding and `reference`.
    ///
    /// Chunks without embeddings are not candidates; a store with no
    /// embedded chunks yields an empty list, not an error.
    async fn query_nearest(&self, reference: &[f32], limit: usize) -> FinQueryResult<Vec<String>>;

    /// Count stored chunks.
    async fn count(&self) -> FinQueryResult<usize>;
}

/// In-memory content store using brute-force scans.
/// Suitable for tests and small corpora (<100k chunks).
pub struct InMemoryContentStore {
    chunks: RwLock<Vec<DocumentChunk>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_chunk(chunk: &DocumentChunk) -> FinQueryResult<()> {
    if chunk.content.trim().is_empty() {
        return Err(FinQueryError::Store(
            "Chunk content must not be blank".to_string(),
        ));
    }
    if let Some(embedding) = &chunk.embedding {
        if embedding.is_empty() {
            return Err(FinQueryError::Store(
                "Chunk embedding must not be empty when present".to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn insert_chunk(&self, chunk: DocumentChunk) -> FinQueryResult<()> {
        validate_chunk(&chunk)?;
        let mut chunks = self.chunks.write().await;
        chunks.push(chunk);
        Ok(())
    }

    async fn query_lexical(&self, pattern: &str, limit: usize) -> FinQueryResult<Vec<String>> {
        let needle = pattern.to_lowercase();
        let chunks = self.chunks.read().await;

        let matches: Vec<String> = chunks
            .iter()
            .filter(|c| c.content.to_lowercase().contains(&needle))
            .take(limit)
            .map(|c| c.content.clone())
            .collect();

        Ok(matches)
    }

    async fn query_nearest(&self, reference: &[f32], limit: usize) -> FinQueryResult<Vec<String>> {
        if reference.is_empty() {
            return Err(FinQueryError::Store(
                "Empty reference embedding".to_string(),
            ));
        }

        let chunks = self.chunks.read().await;

        let mut scored: Vec<(f32, &DocumentChunk)> = chunks
            .iter()
            .filter_map(|c| {
                c.embedding
                    .as_ref()
                    .map(|e| (euclidean_distance(reference, e), c))
            })
            .collect();

        // Sort by distance ascending
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, c)| c.content.clone()).collect())
    }

    async fn count(&self) -> FinQueryResult<usize> {
        let chunks = self.chunks.read().await;
        Ok(chunks.len())
    }
}

/// File-backed content store that persists chunks as JSONL on disk.
/// Loads all chunks into memory on creation and appends on insert.
pub struct FileContentStore {
    path: std::path::PathBuf,
    inner: InMemoryContentStore,
}

impl FileContentStore {
    /// Create a new FileContentStore at the given path.
    /// If the file exists, loads all chunks from it.
    pub async fn new(path: std::path::PathBuf) -> FinQueryResult<Self> {
        let inner = InMemoryContentStore::new();

        if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| FinQueryError::Store(format!("Failed to read store file: {e}")))?;
            for line in data.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                let chunk: DocumentChunk = serde_json::from_str(line)
                    .map_err(|e| FinQueryError::Store(format!("Invalid JSONL chunk: {e}")))?;
                inner.insert_chunk(chunk).await?;
            }
        } else if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FinQueryError::Store(format!("Failed to create store dir: {e}")))?;
        }

        Ok(Self { path, inner })
    }

    /// Append a single chunk to the JSONL file.
    async fn append_to_file(&self, chunk: &DocumentChunk) -> FinQueryResult<()> {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| FinQueryError::Store(format!("Failed to open store file: {e}")))?;
        let mut line = serde_json::to_string(chunk)
            .map_err(|e| FinQueryError::Store(format!("Failed to serialize chunk: {e}")))?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FinQueryError::Store(format!("Failed to write chunk: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn insert_chunk(&self, chunk: DocumentChunk) -> FinQueryResult<()> {
        // Validate through the in-memory insert before touching the file.
        self.inner.insert_chunk(chunk.clone()).await?;
        self.append_to_file(&chunk).await
    }

    async fn query_lexical(&self, pattern: &str, limit: usize) -> FinQueryResult<Vec<String>> {
        self.inner.query_lexical(pattern, limit).await
    }

    async fn query_nearest(&self, reference: &[f32], limit: usize) -> FinQueryResult<Vec<String>> {
        self.inner.query_nearest(reference, limit).await
    }

    async fn count(&self) -> FinQueryResult<usize> {
        self.inner.count().await
    }
}

/// Euclidean distance between two vectors. Mismatched dimensions rank
/// last rather than panicking; mixing dimensions in one store is
/// undefined behavior at the data-model level.
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunk(content: &str, embedding: Option<Vec<f32>>) -> DocumentChunk {
        DocumentChunk::new(content, embedding)
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = InMemoryContentStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert_chunk(chunk("hello", None)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_content() {
        let store = InMemoryContentStore::new();
        assert!(store.insert_chunk(chunk("   \n\t ", None)).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_embedding() {
        let store = InMemoryContentStore::new();
        assert!(store
            .insert_chunk(chunk("content", Some(vec![])))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_lexical_case_insensitive() {
        let store = InMemoryContentStore::new();
        store
            .insert_chunk(chunk("Berkshire Hathaway annual letter", None))
            .await
            .unwrap();

        let upper = store.query_lexical("Berkshire", 5).await.unwrap();
        let lower = store.query_lexical("berkshire", 5).await.unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);
    }

    #[tokio::test]
    async fn test_lexical_preserves_insertion_order() {
        let store = InMemoryContentStore::new();
        store.insert_chunk(chunk("moat one", None)).await.unwrap();
        store.insert_chunk(chunk("moat two", None)).await.unwrap();
        store.insert_chunk(chunk("moat three", None)).await.unwrap();

        let hits = store.query_lexical("moat", 5).await.unwrap();
        assert_eq!(hits, vec!["moat one", "moat two", "moat three"]);
    }

    #[tokio::test]
    async fn test_lexical_respects_limit() {
        let store = InMemoryContentStore::new();
        for i in 0..10 {
            store
                .insert_chunk(chunk(&format!("dividend {i}"), None))
                .await
                .unwrap();
        }

        let hits = store.query_lexical("dividend", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], "dividend 0");
    }

    #[tokio::test]
    async fn test_lexical_no_match_returns_empty() {
        let store = InMemoryContentStore::new();
        store.insert_chunk(chunk("equities", None)).await.unwrap();
        let hits = store.query_lexical("cryptocurrency", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_ascending_distance() {
        let store = InMemoryContentStore::new();
        store
            .insert_chunk(chunk("far", Some(vec![0.0, 1.0])))
            .await
            .unwrap();
        store
            .insert_chunk(chunk("near", Some(vec![0.9, 0.1])))
            .await
            .unwrap();

        let hits = store.query_nearest(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits, vec!["near", "far"]);
    }

    #[tokio::test]
    async fn test_nearest_skips_chunks_without_embeddings() {
        let store = InMemoryContentStore::new();
        store.insert_chunk(chunk("plain", None)).await.unwrap();
        store
            .insert_chunk(chunk("embedded", Some(vec![1.0, 0.0])))
            .await
            .unwrap();

        let hits = store.query_nearest(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits, vec!["embedded"]);
    }

    #[tokio::test]
    async fn test_nearest_empty_store_is_not_an_error() {
        let store = InMemoryContentStore::new();
        store.insert_chunk(chunk("plain", None)).await.unwrap();

        let hits = store.query_nearest(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_empty_reference_is_an_error() {
        let store = InMemoryContentStore::new();
        assert!(store.query_nearest(&[], 5).await.is_err());
    }

    #[test]
    fn test_euclidean_distance_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!(euclidean_distance(&v, &v).abs() < 0.001);
    }

    #[test]
    fn test_euclidean_distance_unit_axes() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((euclidean_distance(&a, &b) - std::f32::consts::SQRT_2).abs() < 0.001);
    }

    #[test]
    fn test_euclidean_distance_mismatched_ranks_last() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(euclidean_distance(&a, &b), f32::MAX);
    }

    // --- FileContentStore tests ---

    #[tokio::test]
    async fn test_file_store_insert_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.jsonl");

        {
            let store = FileContentStore::new(path.clone()).await.unwrap();
            store
                .insert_chunk(chunk("persisted one", None))
                .await
                .unwrap();
            store
                .insert_chunk(chunk("persisted two", Some(vec![0.5, 0.5])))
                .await
                .unwrap();
            assert_eq!(store.count().await.unwrap(), 2);
        }

        let store2 = FileContentStore::new(path).await.unwrap();
        assert_eq!(store2.count().await.unwrap(), 2);
        let hits = store2.query_lexical("persisted", 5).await.unwrap();
        assert_eq!(hits, vec!["persisted one", "persisted two"]);
    }

    #[tokio::test]
    async fn test_file_store_rejected_chunk_not_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.jsonl");

        let store = FileContentStore::new(path.clone()).await.unwrap();
        assert!(store.insert_chunk(chunk("  ", None)).await.is_err());

        let store2 = FileContentStore::new(path).await.unwrap();
        assert_eq!(store2.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_store_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.jsonl");

        let store = FileContentStore::new(path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
