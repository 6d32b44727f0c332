//! paperscout-embed — Embedding backend, content-hash keyed cache, and
//! cosine similarity.

pub mod cache;
pub mod client;
pub mod error;
pub mod similarity;

pub use cache::EmbeddingCache;
pub use client::{Embedder, HttpEmbedder};
pub use error::EmbedError;
pub use similarity::cosine_similarity;
