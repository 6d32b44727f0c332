//! Read-through embedding cache.
//!
//! Keys are content hashes (SHA-256 of model name + normalized text), so a
//! changed text can never hit a stale vector and identical text never
//! recomputes. Disk layout: one JSON file per key under the cache dir, plus
//! a `meta.json` sidecar recording the model for inspection.
//!
//! Concurrency: disk writes go through a temp file and an atomic rename, so
//! a reader never observes a partially written vector. Two tasks racing on
//! the same uncached key may both call the backend; the duplicate write is
//! harmless and the second rename simply wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use paperscout_common::text::normalize;

use crate::client::Embedder;
use crate::error::EmbedError;

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    model: String,
}

pub struct EmbeddingCache {
    dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    mem: RwLock<HashMap<String, Arc<Vec<f32>>>>,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self, EmbedError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        write_meta(&dir, embedder.model_name())?;
        Ok(Self {
            dir,
            embedder,
            mem: RwLock::new(HashMap::new()),
        })
    }

    /// Stable content-hash key for a text under the current model.
    pub fn cache_key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.embedder.model_name().as_bytes());
        hasher.update([0u8]);
        hasher.update(normalize(text).as_bytes());
        hex_digest(hasher)
    }

    /// Read-through lookup: memory, then disk, then the backend.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn get_vector(&self, text: &str) -> Result<Arc<Vec<f32>>, EmbedError> {
        let key = self.cache_key(text);

        if let Some(vector) = self.mem.read().await.get(&key) {
            return Ok(Arc::clone(vector));
        }

        if let Some(vector) = self.load_from_disk(&key)? {
            let vector = Arc::new(vector);
            self.mem.write().await.insert(key, Arc::clone(&vector));
            return Ok(vector);
        }

        let vector = Arc::new(self.embedder.embed(text).await?);
        if let Err(e) = self.store_to_disk(&key, &vector) {
            // Cache persistence failure degrades to recompute-next-run.
            warn!(key = %key, error = %e, "Failed to persist embedding");
        }
        self.mem.write().await.insert(key, Arc::clone(&vector));
        Ok(vector)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn load_from_disk(&self, key: &str) -> Result<Option<Vec<f32>>, EmbedError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Vec<f32>>(&raw) {
            Ok(vector) => {
                debug!(key, dim = vector.len(), "Embedding cache hit (disk)");
                Ok(Some(vector))
            }
            Err(e) => {
                // A corrupt entry is dropped and recomputed, not fatal.
                warn!(key, error = %e, "Dropping corrupt cache entry");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    fn store_to_disk(&self, key: &str, vector: &[f32]) -> Result<(), EmbedError> {
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(tmp.as_file(), vector)?;
        tmp.persist(self.entry_path(key))
            .map_err(|e| EmbedError::Cache(e.error))?;
        Ok(())
    }
}

fn write_meta(dir: &Path, model: &str) -> Result<(), EmbedError> {
    let meta = CacheMeta { model: model.to_string() };
    let path = dir.join("meta.json");
    std::fs::write(&path, serde_json::to_string_pretty(&meta)?)?;
    Ok(())
}

fn hex_digest(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
