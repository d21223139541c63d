use serde::{Deserialize, Serialize};

use crate::errors::RagError;

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// How many embedding requests are in flight at once during ingestion.
    pub embed_batch_size: usize,
    /// Minimum cosine similarity for a chunk to enter the candidate pool.
    pub score_threshold: f32,
    /// Maximum chunks a single document may contribute to one result set.
    pub max_chunks_per_document: usize,
    /// Extracted text shorter than this is treated as unreadable.
    pub min_extract_chars: usize,
    /// Extracted text with a higher ratio of non-printable characters
    /// is treated as binary/corrupt.
    pub max_nonprintable_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            embed_batch_size: 8,
            score_threshold: 0.15,
            max_chunks_per_document: 3,
            min_extract_chars: 50,
            max_nonprintable_ratio: 0.3,
        }
    }
}

impl EngineConfig {
    /// Reject invalid chunking parameters before any I/O happens.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("embed_batch_size must be positive".into()));
        }
        Ok(())
    }
}
