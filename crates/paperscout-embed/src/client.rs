//! Embedding backend client.
//!
//! Any OpenAI-compatible /v1/embeddings endpoint works (OpenAI itself,
//! Ollama, Together, …). The backend must be deterministic for identical
//! input, which is what makes content-hash cache keys sound.

use async_trait::async_trait;
use tracing::{debug, instrument};

use paperscout_common::HttpClient;

use crate::error::EmbedError;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Model identifier, folded into cache keys so switching models
    /// invalidates cached vectors.
    fn model_name(&self) -> &str;
}

pub struct HttpEmbedder {
    client: HttpClient,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(client: HttpClient, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model, len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": &self.model,
            "input": text,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| EmbedError::ScoringUnavailable(format!("embedding request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EmbedError::ScoringUnavailable(format!(
                "embedding backend returned HTTP {}",
                resp.status()
            )));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EmbedError::ScoringUnavailable(format!("embedding response unreadable: {e}")))?;

        let vector = parse_embedding(&payload)?;
        debug!(dim = vector.len(), "Embedding computed");
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Pull the first vector out of an OpenAI-shaped embeddings response.
fn parse_embedding(payload: &serde_json::Value) -> Result<Vec<f32>, EmbedError> {
    let values = payload["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| {
            EmbedError::ScoringUnavailable("embedding response missing data[0].embedding".into())
        })?;
    let vector: Vec<f32> = values
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect();
    if vector.is_empty() {
        return Err(EmbedError::ScoringUnavailable("embedding backend returned an empty vector".into()));
    }
    Ok(vector)
}
