//! Weight pair for combining similarity and keyword scores.

use serde::{Deserialize, Serialize};

/// Weights sum to 1.0, so the combined score is a convex combination of
/// its components and stays in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub similarity: f64,
    pub keyword: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { similarity: 0.85, keyword: 0.15 }
    }
}

impl ScoreWeights {
    pub fn new(similarity: f64, keyword: f64) -> Result<Self, String> {
        let w = Self { similarity, keyword };
        if !w.validate() {
            return Err(format!(
                "weights must sum to 1.0, got {} + {} = {}",
                similarity,
                keyword,
                similarity + keyword
            ));
        }
        Ok(w)
    }

    pub fn validate(&self) -> bool {
        self.similarity >= 0.0
            && self.keyword >= 0.0
            && ((self.similarity + self.keyword) - 1.0).abs() < 1e-6
    }

    pub fn combine(&self, similarity_score: f64, keyword_score: f64) -> f64 {
        self.similarity * similarity_score + self.keyword * keyword_score
    }
}
