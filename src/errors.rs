use thiserror::Error;

/// Errors surfaced by the retrieval engine.
///
/// `Config` rejects bad parameters before any I/O. `Extraction` and
/// `Embedding` are attributed per-file or per-chunk during ingestion.
/// `Storage` is fatal for the operation in progress.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl RagError {
    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        RagError::Storage(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RagError::Embedding(err.to_string())
    }
}
