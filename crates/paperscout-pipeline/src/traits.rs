//! Collaborator seams for the orchestrator.
//!
//! The reference library and the summarizer live behind traits so the
//! pipeline can run against an in-memory library in tests and whatever
//! backend (Zotero-style API, flat files) a binary wires up in production.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use paperscout_extract::ExtractedContent;
use paperscout_ingestion::models::ReferenceItem;
use paperscout_ranker::ScoredCandidate;

/// A candidate that survived the whole pipeline, ready for downstream
/// delivery.
#[derive(Debug, Clone)]
pub struct FinalizedRecord {
    pub scored: ScoredCandidate,
    pub content: ExtractedContent,
    pub summary: Option<String>,
}

/// Identifier used when querying the reference library for a specific
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ReferenceQuery {
    ArxivId(String),
    Doi(String),
    Title(String),
}

/// The personal reference library: the source of similarity anchors and
/// dedup identities, and the sink for accepted papers.
#[async_trait]
pub trait ReferenceManager: Send + Sync {
    async fn list_references(&self) -> anyhow::Result<Vec<ReferenceItem>>;

    async fn find(&self, query: &ReferenceQuery) -> anyhow::Result<Option<ReferenceItem>>;

    async fn persist_record(&self, record: &FinalizedRecord) -> anyhow::Result<()>;
}

/// Optional summarization step applied to each finalized record. The
/// pipeline only carries the resulting text; what model or prompt sits
/// behind this is the implementor's business.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        scored: &ScoredCandidate,
        content: &ExtractedContent,
    ) -> anyhow::Result<String>;
}
