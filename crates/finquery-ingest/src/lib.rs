//! Document ingestion: extraction, chunking, and storage.
//!
//! Reads documents from a [`DocumentSource`], windows the extracted text
//! into overlapping chunks, optionally embeds each chunk, and writes the
//! chunks to the content store in order.
//!
//! # Main types
//!
//! - [`DocumentSource`] — Trait yielding per-page text for each document.
//! - [`PdfDirectorySource`] — Directory of PDF files as a document source.
//! - [`ChunkingConfig`] — Sliding-window parameters (size, overlap).
//! - [`Ingestor`] — Drives extraction → chunking → embedding → storage.

/// Sliding-window text chunking.
pub mod chunker;
/// The ingestion run.
pub mod ingestor;
/// Document sources.
pub mod source;

pub use chunker::{window_text, ChunkingConfig};
pub use ingestor::{IngestReport, Ingestor, EMBED_CONCURRENCY};
pub use source::{DocumentSource, PdfDirectorySource};
