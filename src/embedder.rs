//! Embedding gateway seam.
//!
//! The embedding model is an external, possibly-unavailable dependency,
//! so it is injected as a trait. Tests substitute a deterministic stub;
//! production hosts typically wire up `HttpEmbedder` against a local
//! model server (LM Studio, Ollama, llama.cpp) speaking the
//! OpenAI-compatible embeddings endpoint.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::RagError;

/// Converts text into fixed-length vectors. Dimensionality is fixed
/// for the lifetime of one index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Embed several texts in one request where the backend supports it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model_id: model_id.into(),
        }
    }

    /// The model identifier sent with every request.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn request(&self, input: Value) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model_id,
            "input": input,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::embedding)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "embedding server error: {}",
                text
            )));
        }

        let payload: Value = res.json().await.map_err(RagError::embedding)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.request(json!(text)).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("server returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(json!(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "server returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}
