//! Identity resolver — duplicate detection against the reference corpus.
//!
//! A candidate is a duplicate when any of its canonical identifiers is
//! already present in the reference index: arXiv id first, then DOI, then
//! normalized title. The checks short-circuit on the first hit.
//!
//! Reference items with missing fields contribute whatever identifiers
//! they do have; absence degrades to non-matching and is never an error.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use paperscout_common::text::{normalize_identifier, strip_version};

use crate::models::{Candidate, ReferenceItem};

/// Canonical identifiers derived from a candidate or reference item.
/// Normalization is deterministic and case/whitespace/punctuation-
/// insensitive, so trivially different renderings of the same
/// identifier collide.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierSet {
    pub arxiv_id: Option<String>,
    pub doi: Option<String>,
    pub title: Option<String>,
}

impl IdentifierSet {
    pub fn from_candidate(c: &Candidate) -> Self {
        Self::build(Some(c.arxiv_id.as_str()), c.doi.as_deref(), &c.title)
    }

    pub fn from_reference(r: &ReferenceItem) -> Self {
        Self::build(r.arxiv_id.as_deref(), r.doi.as_deref(), &r.title)
    }

    fn build(arxiv_id: Option<&str>, doi: Option<&str>, title: &str) -> Self {
        let arxiv_id = arxiv_id
            .map(|id| strip_version(id.trim()).to_lowercase())
            .filter(|id| !id.is_empty());
        let doi = doi
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty());
        let title = Some(normalize_identifier(title)).filter(|t| !t.is_empty());
        Self { arxiv_id, doi, title }
    }

    /// A set with no usable identifiers can never match anything.
    pub fn is_empty(&self) -> bool {
        self.arxiv_id.is_none() && self.doi.is_none() && self.title.is_none()
    }
}

/// Membership index over the reference corpus, built once per batch.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    arxiv_ids: HashSet<String>,
    dois: HashSet<String>,
    titles: HashSet<String>,
}

impl ReferenceIndex {
    pub fn build(references: &[ReferenceItem]) -> Self {
        let mut index = Self::default();
        for item in references {
            let ids = IdentifierSet::from_reference(item);
            if ids.is_empty() {
                warn!(title = %item.title, "Reference item carries no usable identifiers");
                continue;
            }
            if let Some(id) = ids.arxiv_id {
                index.arxiv_ids.insert(id);
            }
            if let Some(doi) = ids.doi {
                index.dois.insert(doi);
            }
            if let Some(title) = ids.title {
                index.titles.insert(title);
            }
        }
        debug!(
            arxiv_ids = index.arxiv_ids.len(),
            dois = index.dois.len(),
            titles = index.titles.len(),
            "Reference index built"
        );
        index
    }

    /// Three match rules in order, short-circuiting on the first hit.
    pub fn is_duplicate(&self, candidate: &Candidate) -> bool {
        let ids = IdentifierSet::from_candidate(candidate);
        if ids.is_empty() {
            // Absence of information must not suppress genuinely new papers.
            return false;
        }
        if let Some(id) = &ids.arxiv_id {
            if self.arxiv_ids.contains(id) {
                return true;
            }
        }
        if let Some(doi) = &ids.doi {
            if self.dois.contains(doi) {
                return true;
            }
        }
        if let Some(title) = &ids.title {
            if self.titles.contains(title) {
                return true;
            }
        }
        false
    }
}

/// Remove candidates already present in the reference corpus.
/// Returns the surviving candidates and the number removed.
pub fn filter_new(
    candidates: Vec<Candidate>,
    references: &[ReferenceItem],
) -> (Vec<Candidate>, usize) {
    let index = ReferenceIndex::build(references);
    let before = candidates.len();
    let new: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !index.is_duplicate(c))
        .collect();
    let removed = before - new.len();
    info!(before, removed, remaining = new.len(), "Duplicate filtering complete");
    (new, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(arxiv_id: &str, doi: Option<&str>, title: &str) -> Candidate {
        Candidate {
            arxiv_id: arxiv_id.to_string(),
            doi: doi.map(String::from),
            title: title.to_string(),
            abstract_text: String::new(),
            authors: vec![],
            published_at: Utc::now(),
            categories: vec![],
            abs_url: String::new(),
            pdf_url: String::new(),
            html_url: None,
            github_links: vec![],
        }
    }

    fn reference(arxiv_id: Option<&str>, doi: Option<&str>, title: &str) -> ReferenceItem {
        ReferenceItem {
            arxiv_id: arxiv_id.map(String::from),
            doi: doi.map(String::from),
            title: title.to_string(),
            abstract_text: None,
        }
    }

    #[test]
    fn test_primary_id_exact_match() {
        let refs = vec![reference(Some("2401.12345"), None, "Some Paper")];
        let index = ReferenceIndex::build(&refs);
        assert!(index.is_duplicate(&candidate("2401.12345", None, "Different Title")));
    }

    #[test]
    fn test_primary_id_match_ignores_version_suffix() {
        let refs = vec![reference(Some("2401.12345v2"), None, "Some Paper")];
        let index = ReferenceIndex::build(&refs);
        assert!(index.is_duplicate(&candidate("2401.12345", None, "Other")));
    }

    #[test]
    fn test_doi_match_is_case_insensitive() {
        let refs = vec![reference(None, Some("10.1234/ABC.5678"), "Some Paper")];
        let index = ReferenceIndex::build(&refs);
        assert!(index.is_duplicate(&candidate("9999.00001", Some("10.1234/abc.5678"), "Other")));
    }

    #[test]
    fn test_title_match_normalizes_whitespace_and_case() {
        let refs = vec![reference(None, None, "Flow  Matching for\tRobotic Control")];
        let index = ReferenceIndex::build(&refs);
        assert!(index.is_duplicate(&candidate(
            "9999.00001",
            None,
            "flow matching FOR robotic control"
        )));
    }

    #[test]
    fn test_title_match_ignores_punctuation() {
        let refs = vec![reference(None, None, "Flow Matching for Robotic Control.")];
        let index = ReferenceIndex::build(&refs);
        assert!(index.is_duplicate(&candidate(
            "9999.00001",
            None,
            "Flow Matching for Robotic Control"
        )));
        assert!(index.is_duplicate(&candidate(
            "9999.00002",
            None,
            "Flow-Matching for Robotic Control"
        )));
    }

    #[test]
    fn test_no_identifiers_is_never_duplicate() {
        let refs = vec![reference(None, None, "")];
        let index = ReferenceIndex::build(&refs);
        let c = candidate("", None, "");
        assert!(!index.is_duplicate(&c));
    }

    #[test]
    fn test_new_candidate_survives() {
        let refs = vec![reference(Some("2401.12345"), None, "Known Paper")];
        let (new, removed) = filter_new(vec![candidate("2402.99999", None, "Fresh Paper")], &refs);
        assert_eq!(new.len(), 1);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let refs = vec![
            reference(Some("2401.12345"), None, "Known Paper"),
            reference(None, Some("10.1/xyz"), "Another Known Paper"),
        ];
        let batch = vec![
            candidate("2401.12345", None, "Known Paper"),
            candidate("2402.00001", None, "New A"),
            candidate("2402.00002", Some("10.1/xyz"), "New-ish B"),
        ];
        let (first_pass, removed) = filter_new(batch, &refs);
        assert_eq!(removed, 2);
        let (second_pass, removed_again) = filter_new(first_pass.clone(), &refs);
        assert_eq!(removed_again, 0);
        assert_eq!(first_pass.len(), second_pass.len());
    }

    #[test]
    fn test_malformed_reference_tolerated() {
        // Reference with nothing usable must not panic or match everything.
        let refs = vec![reference(None, None, "   ")];
        let index = ReferenceIndex::build(&refs);
        assert!(!index.is_duplicate(&candidate("2402.12345", None, "Anything")));
    }
}
