//! Candidate scoring and ranking against the reference corpus.

use std::cmp::Ordering;

use tracing::{debug, info, instrument, warn};

use paperscout_embed::{cosine_similarity, EmbedError, EmbeddingCache};
use paperscout_ingestion::models::{Candidate, ReferenceItem};

use crate::keyword::{KeywordScorer, MatchDetails};
use crate::weights::ScoreWeights;

/// A candidate with its component scores. `combined_score` is always
/// recomputed from the components (see [`ScoredCandidate::rescore`]), so
/// re-scoring with different weights is idempotent and side-effect-free.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub similarity_score: f64,
    pub keyword_score: f64,
    pub combined_score: f64,
    /// Title of the closest reference item, for display.
    pub most_similar_to: Option<String>,
    pub match_details: MatchDetails,
}

impl ScoredCandidate {
    pub fn rescore(&mut self, weights: ScoreWeights) {
        self.combined_score = weights.combine(self.similarity_score, self.keyword_score);
    }
}

/// Score, rank, and truncate a candidate batch.
///
/// Similarity is the max cosine against any reference vector — a candidate
/// only needs to be close to one prior interest, not the centroid of all of
/// them. Candidates below `min_similarity` are dropped before combining so
/// keyword bonuses cannot rescue semantically irrelevant papers; the final
/// list keeps the top `top_k` by combined score, ties broken by the more
/// recent `published_at`.
///
/// With an empty reference corpus there is nothing to compare against, so
/// scoring degrades to keyword-only (similarity 0.0, no pre-filter).
#[instrument(skip_all, fields(candidates = candidates.len(), references = references.len()))]
pub async fn score_candidates(
    candidates: Vec<Candidate>,
    references: &[ReferenceItem],
    weights: ScoreWeights,
    keyword_scorer: &KeywordScorer,
    cache: &EmbeddingCache,
    min_similarity: f64,
    top_k: usize,
) -> Result<Vec<ScoredCandidate>, EmbedError> {
    if references.is_empty() {
        warn!("No reference items loaded; falling back to keyword-only scoring");
        return Ok(score_keyword_only(candidates, keyword_scorer, top_k));
    }

    // Reference vectors are computed lazily through the cache; after the
    // first run these are all disk hits.
    let mut reference_vectors = Vec::with_capacity(references.len());
    for item in references {
        let vector = cache.get_vector(&item.embedding_text()).await?;
        reference_vectors.push((item.title.as_str(), vector));
    }

    let mut scored = Vec::new();
    let mut below_threshold = 0usize;

    for candidate in candidates {
        let vector = cache.get_vector(&candidate.searchable_text()).await?;

        let mut similarity_score = 0.0f64;
        let mut most_similar_to: Option<String> = None;
        for (title, reference_vector) in &reference_vectors {
            let sim = cosine_similarity(&vector, reference_vector) as f64;
            if sim > similarity_score {
                similarity_score = sim;
                most_similar_to = Some(title.to_string());
            }
        }

        if similarity_score < min_similarity {
            below_threshold += 1;
            debug!(
                arxiv_id = %candidate.arxiv_id,
                similarity_score,
                min_similarity,
                "Candidate below similarity threshold"
            );
            continue;
        }

        let (keyword_score, match_details) = keyword_scorer.score(&candidate);
        let combined_score = weights.combine(similarity_score, keyword_score);

        scored.push(ScoredCandidate {
            candidate,
            similarity_score,
            keyword_score,
            combined_score,
            most_similar_to,
            match_details,
        });
    }

    sort_ranked(&mut scored);
    scored.truncate(top_k);

    info!(
        kept = scored.len(),
        dropped_below_threshold = below_threshold,
        "Scoring complete"
    );
    Ok(scored)
}

/// Keyword-only ranking, used when the embedding backend is unavailable
/// (and the run is configured to proceed) or the reference corpus is empty.
/// The combined score is the keyword score itself — unavailability is never
/// modeled as zero similarity, which would systematically demote everything.
pub fn score_keyword_only(
    candidates: Vec<Candidate>,
    keyword_scorer: &KeywordScorer,
    top_k: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let (keyword_score, match_details) = keyword_scorer.score(&candidate);
            ScoredCandidate {
                candidate,
                similarity_score: 0.0,
                keyword_score,
                combined_score: keyword_score,
                most_similar_to: None,
                match_details,
            }
        })
        .collect();
    sort_ranked(&mut scored);
    scored.truncate(top_k);
    scored
}

/// Descending combined score; equal scores rank the more recent paper first.
fn sort_ranked(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.candidate.published_at.cmp(&a.candidate.published_at))
    });
}
