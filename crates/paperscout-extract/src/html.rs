//! Structured HTML tier.
//!
//! arXiv serves LaTeXML renderings under /html/{id}: sections are real
//! `<section>` elements with numbered headings, figures carry the
//! `ltx_figure`/`ltx_caption` classes. Availability is probed with a cheap
//! HEAD request before committing to the full download.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use paperscout_common::http::{FetchError, HttpClient, RetryPolicy};
use paperscout_config::ExtractionConfig;
use paperscout_ingestion::models::Candidate;

use crate::content::{ExtractedContent, ExtractionMethod, Figure};

lazy_static! {
    static ref HEADINGS: Selector = Selector::parse("h2, h3, h4").expect("valid selector");
    static ref PARAGRAPHS: Selector = Selector::parse("p").expect("valid selector");
    static ref FIGURES: Selector = Selector::parse("figure.ltx_figure").expect("valid selector");
    static ref CAPTIONS: Selector =
        Selector::parse("figcaption.ltx_caption").expect("valid selector");
    static ref IMAGES: Selector = Selector::parse("img").expect("valid selector");

    // Heading variants in priority order: plain, numbered, roman-numeral.
    static ref INTRODUCTION_HEADINGS: Vec<Regex> = compile_headings(&[
        r"^\s*\d*\.?\s*Introduction\s*$",
        r"^\s*I+\.?\s*Introduction\s*$",
    ]);
    static ref METHODOLOGY_HEADINGS: Vec<Regex> = compile_headings(&[
        r"^\s*\d*\.?\s*Methodology\s*$",
        r"^\s*\d*\.?\s*Methods?\s*$",
        r"^\s*\d*\.?\s*Approach\s*$",
        r"^\s*\d*\.?\s*Proposed\s+Method\s*$",
        r"^\s*\d*\.?\s*Technical\s+Approach\s*$",
    ]);
    static ref CONCLUSION_HEADINGS: Vec<Regex> = compile_headings(&[
        r"^\s*\d*\.?\s*Conclusions?\s*$",
        r"^\s*\d*\.?\s*Discussion\s*$",
        r"^\s*\d*\.?\s*Conclusion\s+and\s+Discussion\s*$",
        r"^\s*\d*\.?\s*Discussion\s+and\s+Conclusion\s*$",
    ]);

    static ref CAPTION_PREFIX: Regex =
        Regex::new(r"(?i)^Figure\s+(\d+)\s*[:.]\s*").expect("valid regex");
}

fn compile_headings(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
        .collect()
}

pub struct HtmlExtractor {
    client: HttpClient,
    retry: RetryPolicy,
    probe_timeout: Duration,
    fetch_timeout: Duration,
    max_figures: usize,
}

impl HtmlExtractor {
    pub fn new(client: HttpClient, config: &ExtractionConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay_ms: config.retry_base_delay_ms,
                retryable_statuses: config.retryable_statuses.clone(),
            },
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            max_figures: config.max_figures,
        }
    }

    /// Cheap availability check; any error counts as unavailable.
    #[instrument(skip(self))]
    pub async fn probe(&self, html_url: &str) -> bool {
        match self.client.head_ok(html_url, self.probe_timeout).await {
            Ok(available) => {
                debug!(html_url, available, "HTML availability probe");
                available
            }
            Err(e) => {
                warn!(html_url, error = %e, "HTML availability probe failed");
                false
            }
        }
    }

    pub fn html_url(candidate: &Candidate) -> String {
        candidate
            .html_url
            .clone()
            .unwrap_or_else(|| Candidate::derive_html_url(&candidate.arxiv_id))
    }

    /// Fetch and parse the structured rendering. Transient failures are
    /// retried per the configured policy; a 404 surfaces immediately so
    /// the caller can fall back without burning the retry budget.
    #[instrument(skip(self, candidate), fields(arxiv_id = %candidate.arxiv_id))]
    pub async fn extract(&self, candidate: &Candidate) -> Result<ExtractedContent, FetchError> {
        let url = Self::html_url(candidate);
        let body = self
            .client
            .get_text_with_retry(&url, self.fetch_timeout, &self.retry)
            .await?;
        Ok(parse_html_content(&body, &url, self.max_figures))
    }
}

/// Parse a LaTeXML page into sections and figures. Pure function so the
/// non-`Send` DOM never lives across an await point.
pub fn parse_html_content(html: &str, page_url: &str, max_figures: usize) -> ExtractedContent {
    let doc = Html::parse_document(html);
    let mut content = ExtractedContent::empty(ExtractionMethod::Html);
    content.introduction = find_section(&doc, &INTRODUCTION_HEADINGS).unwrap_or_default();
    content.methodology = find_section(&doc, &METHODOLOGY_HEADINGS).unwrap_or_default();
    content.conclusion = find_section(&doc, &CONCLUSION_HEADINGS).unwrap_or_default();
    content.figures = extract_figures(&doc, page_url, max_figures);
    content.assemble_full_text();
    debug!(
        intro_chars = content.introduction.len(),
        method_chars = content.methodology.len(),
        conclusion_chars = content.conclusion.len(),
        figures = content.figures.len(),
        "Parsed HTML content"
    );
    content
}

/// First heading matching any pattern (in pattern order) wins; its
/// enclosing section's paragraphs become the section body.
fn find_section(doc: &Html, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        for heading in doc.select(&HEADINGS) {
            let heading_text = collapse_text(heading);
            if !pattern.is_match(&heading_text) {
                continue;
            }
            let Some(container) = enclosing_container(heading) else {
                continue;
            };
            let paragraphs = collect_paragraphs(container, heading);
            if !paragraphs.is_empty() {
                return Some(paragraphs.join("\n\n"));
            }
        }
    }
    None
}

fn enclosing_container(el: ElementRef) -> Option<ElementRef> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| matches!(a.value().name(), "section" | "article" | "div"))
}

fn nearest_section(el: ElementRef) -> Option<ElementRef> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "section")
}

/// Paragraphs of the container, excluding those that belong to a nested
/// subsection with its own heading.
fn collect_paragraphs(container: ElementRef, heading: ElementRef) -> Vec<String> {
    let mut paragraphs = Vec::new();
    for p in container.select(&PARAGRAPHS) {
        if let Some(owner) = nearest_section(p) {
            if owner.id() != container.id() {
                if let Some(nested_heading) = owner.select(&HEADINGS).next() {
                    if nested_heading.id() != heading.id() {
                        continue;
                    }
                }
            }
        }
        let text = collapse_text(p);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }
    paragraphs
}

fn collapse_text(el: ElementRef) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_figures(doc: &Html, page_url: &str, max_figures: usize) -> Vec<Figure> {
    let mut figures = Vec::new();
    for element in doc.select(&FIGURES) {
        if figures.len() >= max_figures {
            break;
        }
        let Some(src) = element
            .select(&IMAGES)
            .next()
            .and_then(|img| img.value().attr("src"))
        else {
            continue;
        };
        let image_url = resolve_image_url(page_url, src);

        let raw_caption = element
            .select(&CAPTIONS)
            .next()
            .map(collapse_text)
            .unwrap_or_default();
        let number = CAPTION_PREFIX
            .captures(&raw_caption)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(figures.len() + 1);
        let caption = CAPTION_PREFIX.replace(&raw_caption, "").trim().to_string();

        figures.push(Figure {
            number,
            caption,
            image_url,
            page: None,
        });
    }
    figures
}

/// Resolve a figure src against the page URL. LaTeXML emits paths relative
/// to the paper directory, so the base must carry a trailing slash.
fn resolve_image_url(page_url: &str, src: &str) -> Option<String> {
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    let base = if page_url.ends_with('/') {
        page_url.to_string()
    } else {
        format!("{page_url}/")
    };
    Url::parse(&base)
        .and_then(|b| b.join(src))
        .map(|u| u.to_string())
        .ok()
}
