//! Persistent storage for document chunks.
//!
//! Provides the [`ContentStore`] trait consumed by the ingestion and
//! retrieval paths, an in-memory implementation for tests and small
//! corpora, a JSONL file-backed implementation for persistence, and a
//! bounded [`StorePool`] whose checkout guards guarantee release on
//! every exit path.
//!
//! # Main types
//!
//! - [`ContentStore`] — Trait for storing and querying document chunks.
//! - [`InMemoryContentStore`] — Brute-force in-memory store.
//! - [`FileContentStore`] — JSONL-persisted store.
//! - [`StorePool`] — Bounded pool handing out scoped [`StoreConn`] guards.

/// Bounded store pool with scoped checkout guards.
pub mod pool;
/// Content store trait and implementations.
pub mod store;

pub use pool::{StoreConn, StorePool};
pub use store::{ContentStore, FileContentStore, InMemoryContentStore};
