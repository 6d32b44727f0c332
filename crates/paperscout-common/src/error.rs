use thiserror::Error;

/// Failures owned by this crate. Domain crates carry their own error
/// enums (`ConfigError`, `EmbedError`, `FetchError`) and the
/// orchestration seams use `anyhow`.
#[derive(Debug, Error)]
pub enum PaperscoutError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
