//! In-memory reference library.
//!
//! Backs tests and small setups where the reference corpus is loaded from
//! a flat file at startup; production backends implement the same trait
//! against their own storage.

use async_trait::async_trait;
use tokio::sync::RwLock;

use paperscout_common::text::{normalize_identifier, strip_version};
use paperscout_ingestion::models::ReferenceItem;

use crate::traits::{FinalizedRecord, ReferenceManager, ReferenceQuery};

#[derive(Default)]
pub struct InMemoryReferenceManager {
    references: RwLock<Vec<ReferenceItem>>,
    records: RwLock<Vec<FinalizedRecord>>,
}

impl InMemoryReferenceManager {
    pub fn new(references: Vec<ReferenceItem>) -> Self {
        Self {
            references: RwLock::new(references),
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn persisted(&self) -> Vec<FinalizedRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ReferenceManager for InMemoryReferenceManager {
    async fn list_references(&self) -> anyhow::Result<Vec<ReferenceItem>> {
        Ok(self.references.read().await.clone())
    }

    async fn find(&self, query: &ReferenceQuery) -> anyhow::Result<Option<ReferenceItem>> {
        let references = self.references.read().await;
        let found = references.iter().find(|r| match query {
            ReferenceQuery::ArxivId(id) => r
                .arxiv_id
                .as_deref()
                .map_or(false, |a| strip_version(a).eq_ignore_ascii_case(strip_version(id))),
            ReferenceQuery::Doi(doi) => r
                .doi
                .as_deref()
                .map_or(false, |d| d.eq_ignore_ascii_case(doi)),
            ReferenceQuery::Title(title) => {
                normalize_identifier(&r.title) == normalize_identifier(title)
            }
        });
        Ok(found.cloned())
    }

    async fn persist_record(&self, record: &FinalizedRecord) -> anyhow::Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
