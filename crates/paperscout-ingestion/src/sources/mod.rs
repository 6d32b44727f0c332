//! Candidate discovery clients.

pub mod arxiv;

use async_trait::async_trait;

use crate::models::Candidate;

/// Common interface for document-discovery collaborators.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Fetch recent candidates across the configured categories,
    /// deduplicated by primary id within the batch.
    async fn fetch_recent(
        &self,
        days_back: i64,
        max_results: usize,
    ) -> anyhow::Result<Vec<Candidate>>;
}
