//! groundline — local retrieval engine for document-grounded chat.
//!
//! Ingests text-bearing documents (extraction, overlapping chunking,
//! embedding), persists them to SQLite, and answers queries with
//! diversified cosine-ranked citations for a language model to use as
//! grounding context. The chat layer, streaming clients, and
//! format-specific extractors are the host application's concern; they
//! plug in through the `Embedder` and `TextExtractor` traits.

pub mod chunker;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod ranker;
pub mod store;

pub use config::EngineConfig;
pub use embedder::{Embedder, HttpEmbedder};
pub use engine::RagEngine;
pub use errors::RagError;
pub use extract::{PlainTextExtractor, TextExtractor};
pub use pipeline::{IngestProgress, SourceFile};
pub use ranker::Citation;
pub use store::{ChunkRecord, DocStatus, Document, DocumentStore, SqliteDocumentStore};
