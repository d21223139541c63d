//! Engine facade: the surface exposed to the surrounding application.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::embedder::Embedder;
use crate::errors::RagError;
use crate::extract::TextExtractor;
use crate::pipeline::{IngestProgress, IngestionPipeline, SourceFile};
use crate::ranker::{self, Citation};
use crate::store::{Document, DocumentStore};

/// Local retrieval engine: ingestion, document management, and
/// similarity-ranked retrieval over one SQLite-backed index.
pub struct RagEngine {
    config: EngineConfig,
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    pipeline: IngestionPipeline,
}

impl RagEngine {
    /// Build an engine. Rejects invalid chunking configuration before
    /// any I/O.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self, RagError> {
        config.validate()?;
        let pipeline = IngestionPipeline::new(
            config.clone(),
            extractor,
            Arc::clone(&embedder),
            Arc::clone(&store),
        );
        Ok(Self {
            config,
            store,
            embedder,
            pipeline,
        })
    }

    /// Ingest one uploaded file. Progress stages stream to
    /// `on_progress`; errors name the file.
    pub async fn ingest_file(
        &self,
        file: &SourceFile,
        on_progress: &mut dyn FnMut(IngestProgress),
    ) -> Result<Document, RagError> {
        self.pipeline.ingest(file, on_progress).await
    }

    /// Ingest a batch of files sequentially; one outcome per file.
    pub async fn ingest_batch(
        &self,
        files: &[SourceFile],
        on_progress: &mut dyn FnMut(&str, IngestProgress),
    ) -> Vec<Result<Document, RagError>> {
        self.pipeline.ingest_batch(files, on_progress).await
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, RagError> {
        self.store.list_documents().await
    }

    pub async fn set_document_enabled(&self, id: &str, enabled: bool) -> Result<(), RagError> {
        self.store.set_enabled(id, enabled).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), RagError> {
        self.store.delete_document(id).await
    }

    /// Embed the query text and rank all enabled chunks against it.
    ///
    /// An embedding-gateway failure degrades to zero citations (the
    /// chat layer proceeds ungrounded); storage failures propagate.
    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<Citation>, RagError> {
        let query_vector = match self.embedder.embed(text).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!("query embedding failed, answering without citations: {}", err);
                return Ok(Vec::new());
            }
        };

        self.search(&query_vector, limit).await
    }

    /// Rank enabled chunks against an already-computed query vector.
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<Citation>, RagError> {
        let candidates = self.store.enabled_chunks().await?;
        tracing::debug!(
            chunks = candidates.len(),
            limit,
            "ranking enabled chunks against query"
        );

        Ok(ranker::search(
            query_vector,
            &candidates,
            limit,
            self.config.score_threshold,
            self.config.max_chunks_per_document,
        ))
    }
}
