//! SQLite-backed document store.
//!
//! Metadata and chunk text live in ordinary rows; embeddings are stored
//! as little-endian f32 BLOBs and scanned brute-force by the ranker.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::{ChunkRecord, DocStatus, Document, DocumentStore, RetrievalCandidate};
use crate::errors::RagError;

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn with_path(db_path: PathBuf) -> Result<Self, RagError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::storage)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), RagError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                media_type TEXT NOT NULL DEFAULT '',
                size_bytes INTEGER NOT NULL DEFAULT 0,
                uploaded_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'ready',
                token_count INTEGER NOT NULL DEFAULT 0,
                enabled INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                content TEXT NOT NULL,
                start_offset INTEGER NOT NULL DEFAULT 0,
                end_offset INTEGER NOT NULL DEFAULT 0,
                embedding BLOB
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id)")
            .execute(&self.pool)
            .await
            .map_err(RagError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
        let uploaded_at: String = row.get("uploaded_at");
        let status: String = row.get("status");
        Document {
            id: row.get("doc_id"),
            name: row.get("name"),
            media_type: row.get("media_type"),
            size_bytes: row.get::<i64, _>("size_bytes") as u64,
            uploaded_at: uploaded_at
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now()),
            status: DocStatus::parse(&status),
            approx_token_count: row.get::<i64, _>("token_count") as u64,
            enabled: row.get::<i64, _>("enabled") != 0,
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> ChunkRecord {
        let embedding_bytes: Vec<u8> = row.get("embedding");
        ChunkRecord {
            id: row.get("chunk_id"),
            document_id: row.get("document_id"),
            text: row.get("content"),
            vector: Self::deserialize_embedding(&embedding_bytes),
            start_offset: row.get::<i64, _>("start_offset") as usize,
            end_offset: row.get::<i64, _>("end_offset") as usize,
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert_document_with_chunks(
        &self,
        document: &Document,
        chunks: &[ChunkRecord],
    ) -> Result<(), RagError> {
        let mut tx = self.pool.begin().await.map_err(RagError::storage)?;

        sqlx::query(
            "INSERT OR REPLACE INTO documents
                 (doc_id, name, media_type, size_bytes, uploaded_at, status, token_count, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&document.id)
        .bind(&document.name)
        .bind(&document.media_type)
        .bind(document.size_bytes as i64)
        .bind(document.uploaded_at.to_rfc3339())
        .bind(document.status.as_str())
        .bind(document.approx_token_count as i64)
        .bind(document.enabled as i64)
        .execute(&mut *tx)
        .await
        .map_err(RagError::storage)?;

        for chunk in chunks {
            let blob = Self::serialize_embedding(&chunk.vector);
            sqlx::query(
                "INSERT OR REPLACE INTO chunks
                     (chunk_id, document_id, content, start_offset, end_offset, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(&chunk.text)
            .bind(chunk.start_offset as i64)
            .bind(chunk.end_offset as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;
        }

        tx.commit().await.map_err(RagError::storage)?;
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>, RagError> {
        let row = sqlx::query("SELECT * FROM documents WHERE doc_id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RagError::storage)?;

        Ok(row.as_ref().map(Self::row_to_document))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, RagError> {
        let rows = sqlx::query("SELECT * FROM documents ORDER BY uploaded_at, doc_id")
            .fetch_all(&self.pool)
            .await
            .map_err(RagError::storage)?;

        Ok(rows.iter().map(Self::row_to_document).collect())
    }

    async fn chunks_for_document(&self, document_id: &str) -> Result<Vec<ChunkRecord>, RagError> {
        let rows = sqlx::query(
            "SELECT * FROM chunks WHERE document_id = ?1 ORDER BY start_offset",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(rows.iter().map(Self::row_to_chunk).collect())
    }

    async fn enabled_chunks(&self) -> Result<Vec<RetrievalCandidate>, RagError> {
        let rows = sqlx::query(
            "SELECT c.chunk_id, c.document_id, c.content, c.start_offset, c.end_offset,
                    c.embedding, d.name AS document_name
             FROM chunks c
             JOIN documents d ON d.doc_id = c.document_id
             WHERE d.enabled = 1
             ORDER BY d.uploaded_at, d.doc_id, c.start_offset",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(rows
            .iter()
            .map(|row| RetrievalCandidate {
                chunk: Self::row_to_chunk(row),
                document_name: row.get("document_name"),
            })
            .collect())
    }

    async fn set_enabled(&self, document_id: &str, enabled: bool) -> Result<(), RagError> {
        sqlx::query("UPDATE documents SET enabled = ?1 WHERE doc_id = ?2")
            .bind(enabled as i64)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(RagError::storage)?;

        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), RagError> {
        let mut tx = self.pool.begin().await.map_err(RagError::storage)?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;

        sqlx::query("DELETE FROM documents WHERE doc_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;

        tx.commit().await.map_err(RagError::storage)?;
        Ok(())
    }

    async fn embedding_model(&self) -> Result<Option<String>, RagError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'embedding_model'")
                .fetch_optional(&self.pool)
                .await
                .map_err(RagError::storage)?;

        Ok(value)
    }

    async fn set_embedding_model(&self, model: &str) -> Result<(), RagError> {
        sqlx::query(
            "INSERT OR REPLACE INTO index_meta (key, value, updated_at)
             VALUES ('embedding_model', ?1, STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        )
        .bind(model)
        .execute(&self.pool)
        .await
        .map_err(RagError::storage)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteDocumentStore {
        let tmp = std::env::temp_dir().join(format!(
            "groundline-store-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteDocumentStore::with_path(tmp).await.unwrap()
    }

    fn make_document(id: &str, name: &str) -> Document {
        Document {
            id: id.to_string(),
            name: name.to_string(),
            media_type: "text/plain".to_string(),
            size_bytes: 100,
            uploaded_at: Utc::now(),
            status: DocStatus::Ready,
            approx_token_count: 25,
            enabled: true,
        }
    }

    fn make_chunk(id: &str, doc_id: &str, text: &str, start: usize) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            document_id: doc_id.to_string(),
            text: text.to_string(),
            vector: vec![1.0, 0.0, 0.0],
            start_offset: start,
            end_offset: start + text.chars().count(),
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let store = test_store().await;

        let doc = make_document("d1", "notes.txt");
        let chunks = vec![make_chunk("c1", "d1", "hello", 0), make_chunk("c2", "d1", "world", 5)];
        store.insert_document_with_chunks(&doc, &chunks).await.unwrap();

        let listed = store.list_documents().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "notes.txt");
        assert_eq!(listed[0].status, DocStatus::Ready);

        let stored = store.chunks_for_document("d1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "hello");
        assert_eq!(stored[0].vector, vec![1.0, 0.0, 0.0]);
        assert_eq!(stored[1].start_offset, 5);
    }

    #[tokio::test]
    async fn delete_cascades_to_chunks() {
        let store = test_store().await;

        store
            .insert_document_with_chunks(
                &make_document("d1", "a.txt"),
                &[make_chunk("c1", "d1", "aaa", 0)],
            )
            .await
            .unwrap();
        store
            .insert_document_with_chunks(
                &make_document("d2", "b.txt"),
                &[make_chunk("c2", "d2", "bbb", 0)],
            )
            .await
            .unwrap();

        store.delete_document("d1").await.unwrap();

        assert!(store.get_document("d1").await.unwrap().is_none());
        assert!(store.chunks_for_document("d1").await.unwrap().is_empty());
        assert_eq!(store.list_documents().await.unwrap().len(), 1);
        assert_eq!(store.chunks_for_document("d2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_and_toggle_unknown_ids_are_noops() {
        let store = test_store().await;
        store.delete_document("missing").await.unwrap();
        store.set_enabled("missing", false).await.unwrap();
    }

    #[tokio::test]
    async fn disabled_documents_excluded_from_enabled_chunks() {
        let store = test_store().await;

        store
            .insert_document_with_chunks(
                &make_document("d1", "a.txt"),
                &[make_chunk("c1", "d1", "aaa", 0)],
            )
            .await
            .unwrap();
        store
            .insert_document_with_chunks(
                &make_document("d2", "b.txt"),
                &[make_chunk("c2", "d2", "bbb", 0)],
            )
            .await
            .unwrap();

        store.set_enabled("d1", false).await.unwrap();

        let candidates = store.enabled_chunks().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].chunk.document_id, "d2");
        assert_eq!(candidates[0].document_name, "b.txt");

        // The document record itself is untouched.
        assert_eq!(store.list_documents().await.unwrap().len(), 2);
        assert!(!store.get_document("d1").await.unwrap().unwrap().enabled);

        store.set_enabled("d1", true).await.unwrap();
        assert_eq!(store.enabled_chunks().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn embedding_model_metadata_round_trips() {
        let store = test_store().await;
        assert!(store.embedding_model().await.unwrap().is_none());

        store.set_embedding_model("all-minilm-l6-v2").await.unwrap();
        assert_eq!(
            store.embedding_model().await.unwrap().as_deref(),
            Some("all-minilm-l6-v2")
        );
    }

    #[tokio::test]
    async fn empty_vector_survives_round_trip() {
        let store = test_store().await;

        let mut chunk = make_chunk("c1", "d1", "unembedded", 0);
        chunk.vector = Vec::new();
        store
            .insert_document_with_chunks(&make_document("d1", "a.txt"), &[chunk])
            .await
            .unwrap();

        let stored = store.chunks_for_document("d1").await.unwrap();
        assert!(stored[0].vector.is_empty());
    }
}
