//! Document store: persistence for documents and their chunks.
//!
//! The store owns the chunk collection outright; the ranker receives
//! candidate rows by value from `enabled_chunks` rather than reaching
//! into any shared index state.

mod sqlite;

pub use sqlite::SqliteDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RagError;

/// Lifecycle state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    Processing,
    Ready,
    Error,
}

impl DocStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocStatus::Processing => "processing",
            DocStatus::Ready => "ready",
            DocStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => DocStatus::Processing,
            "error" => DocStatus::Error,
            _ => DocStatus::Ready,
        }
    }
}

/// One ingested source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub status: DocStatus,
    /// Rough estimate (chars / 4), informational only.
    pub approx_token_count: u64,
    /// Whether this document's chunks participate in retrieval.
    pub enabled: bool,
}

/// One stored text window of a document. Immutable after ingestion;
/// deleted together with its owning document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub document_id: String,
    pub text: String,
    /// Empty when the embedding attempt for this chunk failed; such
    /// chunks score zero and are never retrieved.
    pub vector: Vec<f32>,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A chunk joined with its document name, as fed to the ranker.
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    pub chunk: ChunkRecord,
    pub document_name: String,
}

/// Abstract persistence for documents and chunks.
///
/// Individual calls are atomic; no isolation is provided across calls.
/// Callers must not interleave a query with a structural mutation of
/// the same document set.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a document and all of its chunks in one transaction.
    /// Either every record lands or none do.
    async fn insert_document_with_chunks(
        &self,
        document: &Document,
        chunks: &[ChunkRecord],
    ) -> Result<(), RagError>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>, RagError>;

    async fn list_documents(&self) -> Result<Vec<Document>, RagError>;

    /// Chunks of one document, ordered by start offset.
    async fn chunks_for_document(&self, document_id: &str) -> Result<Vec<ChunkRecord>, RagError>;

    /// All chunks whose owning document is enabled, in a deterministic
    /// order (document upload time, then chunk offset).
    async fn enabled_chunks(&self) -> Result<Vec<RetrievalCandidate>, RagError>;

    /// Toggle retrieval participation. No-op on an unknown id.
    async fn set_enabled(&self, document_id: &str, enabled: bool) -> Result<(), RagError>;

    /// Delete a document and cascade to all of its chunks. No-op on an
    /// unknown id; never leaves orphaned chunks.
    async fn delete_document(&self, document_id: &str) -> Result<(), RagError>;

    /// Name of the embedding model the index was built with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, RagError>;

    /// Record the embedding model name so hosts can detect a change.
    async fn set_embedding_model(&self, model: &str) -> Result<(), RagError>;
}
