//! Ingestion pipeline: extract, chunk, embed, persist.
//!
//! One file at a time. Embedding requests for a document's chunks go
//! out in bounded concurrent groups; a failed embedding degrades that
//! chunk (empty vector, never retrievable) instead of failing the
//! document. Persistence is a single store transaction, so a failure
//! at any step leaves no partial document behind.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use uuid::Uuid;

use crate::chunker;
use crate::config::EngineConfig;
use crate::embedder::Embedder;
use crate::errors::RagError;
use crate::extract::{validate_extracted, TextExtractor};
use crate::store::{ChunkRecord, DocStatus, Document, DocumentStore};

/// An uploaded file handed to the pipeline by the host application.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Progress stages emitted to the caller for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestProgress {
    Extracting,
    Chunking,
    Embedding { completed: usize, total: usize },
    Indexing,
}

pub struct IngestionPipeline {
    config: EngineConfig,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
}

impl IngestionPipeline {
    pub fn new(
        config: EngineConfig,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            extractor,
            embedder,
            store,
        }
    }

    /// Ingest one file end to end. Errors name the file.
    pub async fn ingest(
        &self,
        file: &SourceFile,
        on_progress: &mut dyn FnMut(IngestProgress),
    ) -> Result<Document, RagError> {
        self.run(file, on_progress)
            .await
            .map_err(|err| attribute_to_file(err, &file.name))
    }

    /// Ingest several files strictly sequentially, one outcome per
    /// input file. A failure is reported against its file and does not
    /// abort the rest of the batch.
    pub async fn ingest_batch(
        &self,
        files: &[SourceFile],
        on_progress: &mut dyn FnMut(&str, IngestProgress),
    ) -> Vec<Result<Document, RagError>> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let mut forward = |stage: IngestProgress| on_progress(&file.name, stage);
            let outcome = self.ingest(file, &mut forward).await;
            if let Err(err) = &outcome {
                tracing::warn!("ingestion of {} failed: {}", file.name, err);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn run(
        &self,
        file: &SourceFile,
        on_progress: &mut dyn FnMut(IngestProgress),
    ) -> Result<Document, RagError> {
        on_progress(IngestProgress::Extracting);
        let text = self.extractor.extract(&file.bytes, &file.media_type)?;
        validate_extracted(&text, &self.config)?;

        on_progress(IngestProgress::Chunking);
        let windows = chunker::split_text(&text, self.config.chunk_size, self.config.chunk_overlap)?;

        let mut document = Document {
            id: Uuid::new_v4().to_string(),
            name: file.name.clone(),
            media_type: file.media_type.clone(),
            size_bytes: file.bytes.len() as u64,
            uploaded_at: Utc::now(),
            status: DocStatus::Processing,
            approx_token_count: (text.chars().count() / 4) as u64,
            enabled: true,
        };

        let total = windows.len();
        on_progress(IngestProgress::Embedding {
            completed: 0,
            total,
        });

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);
        for group in windows.chunks(self.config.embed_batch_size) {
            let futures = group.iter().map(|window| self.embedder.embed(&window.text));
            for (window, result) in group.iter().zip(join_all(futures).await) {
                match result {
                    Ok(vector) => vectors.push(vector),
                    Err(err) => {
                        // Degrade rather than lose the whole document:
                        // an empty vector scores zero and is never
                        // retrieved.
                        tracing::warn!(
                            "embedding failed for chunk at offset {} of {}: {}",
                            window.start_offset,
                            file.name,
                            err
                        );
                        vectors.push(Vec::new());
                    }
                }
            }
            on_progress(IngestProgress::Embedding {
                completed: vectors.len(),
                total,
            });
        }

        let chunks: Vec<ChunkRecord> = windows
            .into_iter()
            .zip(vectors)
            .map(|(window, vector)| ChunkRecord {
                id: Uuid::new_v4().to_string(),
                document_id: document.id.clone(),
                text: window.text,
                vector,
                start_offset: window.start_offset,
                end_offset: window.end_offset,
            })
            .collect();

        on_progress(IngestProgress::Indexing);
        document.status = DocStatus::Ready;
        self.store
            .insert_document_with_chunks(&document, &chunks)
            .await?;

        tracing::info!(
            "ingested {} ({} chunks, ~{} tokens)",
            file.name,
            chunks.len(),
            document.approx_token_count
        );

        Ok(document)
    }
}

fn attribute_to_file(err: RagError, file_name: &str) -> RagError {
    match err {
        RagError::Config(msg) => RagError::Config(msg),
        RagError::Extraction(msg) => RagError::Extraction(format!("{file_name}: {msg}")),
        RagError::Embedding(msg) => RagError::Embedding(format!("{file_name}: {msg}")),
        RagError::Storage(msg) => RagError::Storage(format!("{file_name}: {msg}")),
    }
}
