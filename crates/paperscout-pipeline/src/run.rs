//! The triage run: dedup → score → extract → finalize.

use std::time::Instant;

use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use paperscout_config::{AppConfig, OnScoringUnavailable};
use paperscout_embed::{EmbedError, EmbeddingCache};
use paperscout_extract::ContentExtractor;
use paperscout_ingestion::dedup::filter_new;
use paperscout_ingestion::models::{Candidate, ReferenceItem};
use paperscout_ranker::{
    score_candidates, score_keyword_only, KeywordScorer, ScoreWeights, ScoredCandidate,
};

use crate::traits::{FinalizedRecord, ReferenceManager, Summarizer};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub duplicates: usize,
    pub scored: usize,
    pub extracted: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

pub struct PipelineOutput {
    pub records: Vec<FinalizedRecord>,
    pub summary: RunSummary,
}

/// External collaborators wired in by the caller. The extractor and cache
/// are mandatory; summarization and persistence are optional steps.
pub struct Collaborators<'a> {
    pub cache: &'a EmbeddingCache,
    pub extractor: &'a dyn ContentExtractor,
    pub summarizer: Option<&'a dyn Summarizer>,
    pub manager: Option<&'a dyn ReferenceManager>,
}

/// Run the full triage pipeline over one discovery batch.
///
/// Stage failures are contained: one candidate failing extraction or
/// summarization never aborts the others, and a run always completes with
/// whatever subset survived. The only aborting condition is an unavailable
/// embedding backend with `on_scoring_unavailable = abort`.
#[instrument(skip_all, fields(fetched = candidates.len()))]
pub async fn run_pipeline(
    candidates: Vec<Candidate>,
    references: &[ReferenceItem],
    config: &AppConfig,
    collaborators: Collaborators<'_>,
) -> anyhow::Result<PipelineOutput> {
    let started = Instant::now();
    let mut summary = RunSummary {
        fetched: candidates.len(),
        ..RunSummary::default()
    };

    let (fresh, duplicates) = filter_new(candidates, references);
    summary.duplicates = duplicates;

    let ranked = rank(fresh, references, config, collaborators.cache).await?;
    summary.scored = ranked.len();

    let pairs = extract_all(ranked, collaborators.extractor, config.extraction.concurrency).await;

    let mut records = Vec::with_capacity(pairs.len());
    for (scored, content) in pairs {
        if content.is_empty() {
            summary.errors += 1;
        } else {
            summary.extracted += 1;
        }

        let summary_text = match collaborators.summarizer {
            Some(summarizer) => match summarizer.summarize(&scored, &content).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(arxiv_id = %scored.candidate.arxiv_id, error = %e, "Summarization failed");
                    summary.errors += 1;
                    None
                }
            },
            None => None,
        };

        let record = FinalizedRecord {
            scored,
            content,
            summary: summary_text,
        };
        if let Some(manager) = collaborators.manager {
            if let Err(e) = manager.persist_record(&record).await {
                warn!(arxiv_id = %record.scored.candidate.arxiv_id, error = %e, "Persisting record failed");
                summary.errors += 1;
            }
        }
        records.push(record);
    }

    summary.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        fetched = summary.fetched,
        duplicates = summary.duplicates,
        scored = summary.scored,
        extracted = summary.extracted,
        errors = summary.errors,
        duration_ms = summary.duration_ms,
        "Pipeline run complete"
    );
    Ok(PipelineOutput { records, summary })
}

async fn rank(
    candidates: Vec<Candidate>,
    references: &[ReferenceItem],
    config: &AppConfig,
    cache: &EmbeddingCache,
) -> anyhow::Result<Vec<ScoredCandidate>> {
    let keyword_scorer = KeywordScorer::new(&config.keywords);
    let weights = ScoreWeights::new(
        config.scoring.similarity_weight,
        config.scoring.keyword_weight,
    )
    .map_err(|e| anyhow!(e))?;

    match score_candidates(
        candidates.clone(),
        references,
        weights,
        &keyword_scorer,
        cache,
        config.scoring.min_similarity,
        config.scoring.top_k,
    )
    .await
    {
        Ok(ranked) => Ok(ranked),
        Err(EmbedError::ScoringUnavailable(reason)) => {
            match config.scoring.on_scoring_unavailable {
                OnScoringUnavailable::KeywordOnly => {
                    warn!(reason, "Embedding backend unavailable, ranking by keywords only");
                    Ok(score_keyword_only(
                        candidates,
                        &keyword_scorer,
                        config.scoring.top_k,
                    ))
                }
                OnScoringUnavailable::Abort => Err(anyhow!("scoring unavailable: {reason}")),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Extract the ranked candidates with bounded concurrency. Completion
/// order is arbitrary, so results carry their rank index and are sorted
/// back before handoff.
async fn extract_all(
    ranked: Vec<ScoredCandidate>,
    extractor: &dyn ContentExtractor,
    concurrency: usize,
) -> Vec<(ScoredCandidate, paperscout_extract::ExtractedContent)> {
    let mut indexed: Vec<_> = stream::iter(ranked.into_iter().enumerate())
        .map(|(index, scored)| async move {
            let content = extractor.extract(&scored.candidate).await;
            (index, scored, content)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(index, _, _)| *index);
    indexed
        .into_iter()
        .map(|(_, scored, content)| (scored, content))
        .collect()
}
