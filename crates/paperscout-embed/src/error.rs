use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedding backend is down or returned garbage. Surfaced to the
    /// orchestrator so it can choose keyword-only scoring or abort; never
    /// silently mapped to a zero vector.
    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("cache I/O error: {0}")]
    Cache(#[from] std::io::Error),

    #[error("cache entry corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
