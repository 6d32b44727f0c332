//! paperscout-config — Typed configuration surface for a pipeline run.
//!
//! Loaded from YAML. Every section has serde defaults so a partial file is
//! valid; `AppConfig::validate` is the single fail-fast gate (weights must
//! sum to 1.0, cutoffs must be sane) and must be called before a run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub arxiv: ArxivConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.scoring.similarity_weight + self.scoring.keyword_weight;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "similarity_weight + keyword_weight must equal 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&self.scoring.min_similarity) {
            return Err(ConfigError::Invalid(format!(
                "min_similarity must be in [0, 1], got {}",
                self.scoring.min_similarity
            )));
        }
        if self.scoring.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".into()));
        }
        if self.extraction.concurrency == 0 {
            return Err(ConfigError::Invalid("extraction concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

// ── Discovery ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Categories to poll (e.g. "cs.AI", "cs.RO").
    pub categories: Vec<String>,
    pub max_results: usize,
    pub days_back: i64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            categories: vec!["cs.AI".to_string()],
            max_results: 50,
            days_back: 7,
        }
    }
}

// ── Keywords ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default = "default_true")]
    pub boost_github: bool,
}

fn default_true() -> bool {
    true
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// What the orchestrator does when the embedding backend is down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnScoringUnavailable {
    /// Rank by keyword score alone.
    KeywordOnly,
    /// Abort the run.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub similarity_weight: f64,
    pub keyword_weight: f64,
    /// Pre-filter: candidates below this similarity are dropped before
    /// combining, so keyword bonuses cannot rescue irrelevant papers.
    pub min_similarity: f64,
    /// Post-filter: keep the top K by combined score.
    pub top_k: usize,
    pub on_scoring_unavailable: OnScoringUnavailable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 0.85,
            keyword_weight: 0.15,
            min_similarity: 0.3,
            top_k: 10,
            on_scoring_unavailable: OnScoringUnavailable::KeywordOnly,
        }
    }
}

// ── Embedding ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible /v1/embeddings endpoint.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// On-disk embedding cache location.
    pub cache_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            api_key: None,
            cache_dir: "data/embeddings".to_string(),
        }
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// HEAD probe timeout for the HTML availability check, seconds.
    pub probe_timeout_secs: u64,
    /// GET timeout for HTML and PDF downloads, seconds.
    pub fetch_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
    pub max_figures: usize,
    /// Embedded images below this byte count are treated as icons/logos.
    pub min_figure_bytes: usize,
    /// How many candidates are extracted concurrently.
    pub concurrency: usize,
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            fetch_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retryable_statuses: default_retryable_statuses(),
            max_figures: 3,
            min_figure_bytes: 10_000,
            concurrency: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut cfg = AppConfig::default();
        cfg.scoring.similarity_weight = 0.9;
        cfg.scoring.keyword_weight = 0.3;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut cfg = AppConfig::default();
        cfg.scoring.top_k = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_partial_yaml() {
        let yaml = r#"
keywords:
  primary: ["flow matching", "diffusion policy"]
  secondary: ["manipulation"]
scoring:
  similarity_weight: 0.7
  keyword_weight: 0.3
  min_similarity: 0.5
  top_k: 5
  on_scoring_unavailable: abort
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.keywords.primary.len(), 2);
        assert_eq!(cfg.scoring.top_k, 5);
        assert_eq!(cfg.scoring.on_scoring_unavailable, OnScoringUnavailable::Abort);
        // Untouched sections fall back to defaults
        assert_eq!(cfg.extraction.max_figures, 3);
        assert_eq!(cfg.arxiv.max_results, 50);
    }
}
