use async_trait::async_trait;
use finquery_core::{FinQueryError, FinQueryResult};
use std::path::PathBuf;

/// A location that yields documents as ordered page texts.
///
/// The underlying parser is a black box: a source only has to produce
/// the text of each page, in page order. A missing location is reported
/// through [`available`](DocumentSource::available) rather than an error,
/// so ingestion can describe the problem instead of failing.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location, used in report messages.
    fn location(&self) -> String;

    /// Whether the source location exists at all.
    fn available(&self) -> bool;

    /// Document identifiers in a deterministic order.
    async fn list_documents(&self) -> FinQueryResult<Vec<String>>;

    /// Per-page text for one document, page order preserved.
    async fn extract_pages(&self, name: &str) -> FinQueryResult<Vec<String>>;
}

/// A directory of PDF files. Documents are the `*.pdf` entries sorted by
/// file name; page text comes from lopdf, run on the blocking pool.
pub struct PdfDirectorySource {
    dir: PathBuf,
}

impl PdfDirectorySource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl DocumentSource for PdfDirectorySource {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn available(&self) -> bool {
        self.dir.is_dir()
    }

    async fn list_documents(&self) -> FinQueryResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| FinQueryError::Ingest(format!("Failed to read directory: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FinQueryError::Ingest(format!("Failed to read directory entry: {e}")))?
        {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if is_pdf {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        // Sorted listing keeps chunk boundaries deterministic across runs.
        names.sort();
        Ok(names)
    }

    async fn extract_pages(&self, name: &str) -> FinQueryResult<Vec<String>> {
        let path = self.dir.join(name);

        let pages = tokio::task::spawn_blocking(move || -> FinQueryResult<Vec<String>> {
            let doc = lopdf::Document::load(&path)
                .map_err(|e| FinQueryError::Ingest(format!("Failed to load PDF: {e}")))?;

            let mut texts = Vec::new();
            for page_number in doc.get_pages().keys() {
                let text = doc
                    .extract_text(&[*page_number])
                    .map_err(|e| {
                        FinQueryError::Ingest(format!(
                            "Failed to extract text from page {page_number}: {e}"
                        ))
                    })?;
                texts.push(text);
            }
            Ok(texts)
        })
        .await
        .map_err(|e| FinQueryError::Ingest(format!("PDF extraction task failed: {e}")))??;

        Ok(pages)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_is_unavailable() {
        let source = PdfDirectorySource::new(PathBuf::from("/nonexistent/letters"));
        assert!(!source.available());
        assert!(source.location().contains("letters"));
    }

    #[tokio::test]
    async fn test_listing_filters_and_sorts_pdfs() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf"] {
            std::fs::write(tmp.path().join(name), b"stub").unwrap();
        }

        let source = PdfDirectorySource::new(tmp.path().to_path_buf());
        assert!(source.available());

        let docs = source.list_documents().await.unwrap();
        assert_eq!(docs, vec!["a.PDF", "b.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_an_ingest_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("broken.pdf"), b"not a pdf").unwrap();

        let source = PdfDirectorySource::new(tmp.path().to_path_buf());
        let result = source.extract_pages("broken.pdf").await;
        assert!(matches!(result, Err(FinQueryError::Ingest(_))));
    }
}
