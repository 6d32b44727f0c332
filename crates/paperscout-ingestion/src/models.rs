//! Data models for the triage pipeline.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use paperscout_common::text::strip_version;

lazy_static! {
    static ref GITHUB_LINK: Regex =
        Regex::new(r"https?://github\.com/[\w\-]+/[\w\-.]+").expect("valid regex");
}

/// One discovered paper awaiting relevance evaluation.
/// Identity fields are never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// arXiv id with the version suffix already stripped.
    pub arxiv_id: String,
    pub doi: Option<String>,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<Author>,
    pub published_at: DateTime<Utc>,
    pub categories: Vec<String>,
    pub abs_url: String,
    pub pdf_url: String,
    /// Structured (LaTeXML) rendering, when arXiv provides one.
    pub html_url: Option<String>,
    /// Code links mined from the comment and abstract.
    pub github_links: Vec<String>,
}

impl Candidate {
    /// Text used for embedding and keyword matching: title plus abstract.
    pub fn searchable_text(&self) -> String {
        if self.abstract_text.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.abstract_text)
        }
    }

    /// Derive the structured-rendering URL from the id.
    pub fn derive_html_url(arxiv_id: &str) -> String {
        format!("https://arxiv.org/html/{}", strip_version(arxiv_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub affiliation: Option<String>,
}

/// One entry in the personal reference corpus, used as a similarity anchor.
/// Treated as immutable for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub arxiv_id: Option<String>,
    pub doi: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
}

impl ReferenceItem {
    /// Text used when lazily embedding this item.
    pub fn embedding_text(&self) -> String {
        match &self.abstract_text {
            Some(a) if !a.trim().is_empty() => format!("{} {}", self.title, a),
            _ => self.title.clone(),
        }
    }
}

/// Mine GitHub repository links out of free text (comment + abstract).
pub fn extract_github_links(texts: &[&str]) -> Vec<String> {
    let mut links: Vec<String> = texts
        .iter()
        .flat_map(|t| GITHUB_LINK.find_iter(t).map(|m| m.as_str().to_string()))
        .collect();
    links.sort();
    links.dedup();
    links
}
