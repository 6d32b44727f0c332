//! arXiv API client.
//!
//! Endpoint: https://export.arxiv.org/api/query
//! The feed is Atom XML; entries carry arXiv extensions (arxiv:comment,
//! arxiv:doi) alongside the standard elements.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use paperscout_common::text::strip_version;
use paperscout_common::HttpClient;

use crate::models::{extract_github_links, Author, Candidate};
use super::DiscoverySource;

const ARXIV_QUERY_URL: &str = "https://export.arxiv.org/api/query";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ArxivClient {
    client: HttpClient,
    categories: Vec<String>,
}

impl ArxivClient {
    pub fn new(client: HttpClient, categories: Vec<String>) -> Self {
        Self { client, categories }
    }

    /// Fetch the newest submissions for one category.
    #[instrument(skip(self))]
    async fn fetch_category(
        &self,
        category: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<Candidate>> {
        let url = format!(
            "{}?search_query=cat:{}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            ARXIV_QUERY_URL, category, max_results
        );
        let xml = self
            .client
            .get_text(&url, FETCH_TIMEOUT)
            .await
            .map_err(|e| anyhow::anyhow!("arXiv query failed for {category}: {e}"))?;

        let candidates = parse_arxiv_atom(&xml)?;
        debug!(category, fetched = candidates.len(), "arXiv feed parsed");
        Ok(candidates)
    }
}

#[async_trait]
impl DiscoverySource for ArxivClient {
    async fn fetch_recent(
        &self,
        days_back: i64,
        max_results: usize,
    ) -> anyhow::Result<Vec<Candidate>> {
        let cutoff = Utc::now() - ChronoDuration::days(days_back);
        let mut all: Vec<Candidate> = Vec::new();

        for category in &self.categories {
            let batch = self.fetch_category(category, max_results).await?;
            for candidate in batch {
                if candidate.published_at < cutoff {
                    continue;
                }
                // Papers cross-listed in several categories arrive once per feed.
                if all.iter().any(|c| c.arxiv_id == candidate.arxiv_id) {
                    continue;
                }
                all.push(candidate);
            }
        }

        Ok(all)
    }
}

/// Parse an arXiv Atom feed into candidates.
/// Entries without a title or id are skipped.
pub fn parse_arxiv_atom(xml: &str) -> anyhow::Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    struct EntryDraft {
        id: String,
        doi: Option<String>,
        title: String,
        summary: String,
        comment: String,
        authors: Vec<Author>,
        published: Option<DateTime<Utc>>,
        categories: Vec<String>,
        abs_url: String,
        pdf_url: String,
    }

    let mut current: Option<EntryDraft> = None;
    let mut in_id = false;
    let mut in_title = false;
    let mut in_summary = false;
    let mut in_comment = false;
    let mut in_doi = false;
    let mut in_published = false;
    let mut in_author_name = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"entry" => {
                    current = Some(EntryDraft {
                        id: String::new(),
                        doi: None,
                        title: String::new(),
                        summary: String::new(),
                        comment: String::new(),
                        authors: vec![],
                        published: None,
                        categories: vec![],
                        abs_url: String::new(),
                        pdf_url: String::new(),
                    });
                }
                b"id" => in_id = current.is_some(),
                b"title" => in_title = current.is_some(),
                b"summary" => in_summary = current.is_some(),
                b"arxiv:comment" => in_comment = current.is_some(),
                b"arxiv:doi" => in_doi = current.is_some(),
                b"published" => in_published = current.is_some(),
                b"name" => in_author_name = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(ref mut entry) = current {
                    match e.name().as_ref() {
                        b"link" => {
                            let mut href = String::new();
                            let mut rel = String::new();
                            let mut link_title = String::new();
                            for attr in e.attributes().flatten() {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                match attr.key.as_ref() {
                                    b"href" => href = value,
                                    b"rel" => rel = value,
                                    b"title" => link_title = value,
                                    _ => {}
                                }
                            }
                            if link_title == "pdf" {
                                entry.pdf_url = href;
                            } else if rel == "alternate" {
                                entry.abs_url = href;
                            }
                        }
                        b"category" => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"term" {
                                    entry
                                        .categories
                                        .push(String::from_utf8_lossy(&attr.value).to_string());
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut entry) = current {
                    if in_id {
                        entry.id = text.clone();
                    }
                    if in_title {
                        entry.title = collapse_ws(&text);
                    }
                    if in_summary {
                        entry.summary = collapse_ws(&text);
                    }
                    if in_comment {
                        entry.comment = text.clone();
                    }
                    if in_doi {
                        entry.doi = Some(text.clone());
                    }
                    if in_published {
                        entry.published = DateTime::parse_from_rfc3339(&text)
                            .map(|dt| dt.with_timezone(&Utc))
                            .ok();
                    }
                    if in_author_name {
                        entry.authors.push(Author { name: text.clone(), affiliation: None });
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"id" => in_id = false,
                b"title" => in_title = false,
                b"summary" => in_summary = false,
                b"arxiv:comment" => in_comment = false,
                b"arxiv:doi" => in_doi = false,
                b"published" => in_published = false,
                b"name" => in_author_name = false,
                b"entry" => {
                    if let Some(entry) = current.take() {
                        match finish_entry(entry) {
                            Some(candidate) => candidates.push(candidate),
                            None => warn!("Skipping feed entry with missing id or title"),
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Atom parse error: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    fn finish_entry(entry: EntryDraft) -> Option<Candidate> {
        let raw_id = entry.id.rsplit("/abs/").next().unwrap_or_default();
        let arxiv_id = strip_version(raw_id).to_string();
        if arxiv_id.is_empty() || entry.title.is_empty() {
            return None;
        }
        let github_links =
            extract_github_links(&[entry.comment.as_str(), entry.summary.as_str()]);
        Some(Candidate {
            html_url: Some(Candidate::derive_html_url(&arxiv_id)),
            pdf_url: if entry.pdf_url.is_empty() {
                format!("https://arxiv.org/pdf/{arxiv_id}")
            } else {
                entry.pdf_url
            },
            abs_url: if entry.abs_url.is_empty() {
                format!("https://arxiv.org/abs/{arxiv_id}")
            } else {
                entry.abs_url
            },
            arxiv_id,
            doi: entry.doi,
            title: entry.title,
            abstract_text: entry.summary,
            authors: entry.authors,
            published_at: entry.published.unwrap_or_else(Utc::now),
            categories: entry.categories,
            github_links,
        })
    }

    Ok(candidates)
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2401.12345v2</id>
    <published>2024-01-22T18:00:00Z</published>
    <title>Flow Matching for
        Robotic Control</title>
    <summary>We study flow matching. Code: https://github.com/acme/flowctl</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <arxiv:comment>Accepted at CoRL. https://github.com/acme/flowctl</arxiv:comment>
    <arxiv:doi>10.1234/flow.2024</arxiv:doi>
    <link href="http://arxiv.org/abs/2401.12345v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.12345v2" rel="related" type="application/pdf"/>
    <category term="cs.RO" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_entry() {
        let candidates = parse_arxiv_atom(SAMPLE_FEED).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.arxiv_id, "2401.12345");
        assert_eq!(c.title, "Flow Matching for Robotic Control");
        assert_eq!(c.doi.as_deref(), Some("10.1234/flow.2024"));
        assert_eq!(c.authors.len(), 2);
        assert_eq!(c.authors[0].name, "Ada Lovelace");
        assert_eq!(c.categories, vec!["cs.RO", "cs.AI"]);
        assert_eq!(c.pdf_url, "http://arxiv.org/pdf/2401.12345v2");
        assert_eq!(c.html_url.as_deref(), Some("https://arxiv.org/html/2401.12345"));
    }

    #[test]
    fn test_parse_atom_dedups_github_links() {
        let candidates = parse_arxiv_atom(SAMPLE_FEED).unwrap();
        assert_eq!(candidates[0].github_links, vec!["https://github.com/acme/flowctl"]);
    }

    #[test]
    fn test_entry_without_title_skipped() {
        let xml = r#"<feed><entry><id>http://arxiv.org/abs/2401.1v1</id></entry></feed>"#;
        let candidates = parse_arxiv_atom(xml).unwrap();
        assert!(candidates.is_empty());
    }
}

