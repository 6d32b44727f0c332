//! paperscout-ranker — Hybrid relevance scoring.
//!
//! similarity = max cosine against the reference corpus,
//! keyword = capped accumulation of configured keyword matches,
//! combined = w_sim · similarity + w_kw · keyword.

pub mod keyword;
pub mod scorer;
pub mod weights;

pub use keyword::{KeywordScorer, MatchDetails};
pub use scorer::{score_candidates, score_keyword_only, ScoredCandidate};
pub use weights::ScoreWeights;
