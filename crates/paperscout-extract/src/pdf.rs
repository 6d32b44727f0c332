//! PDF fallback tier.
//!
//! Flat text extraction only: the introduction is recovered with heading
//! heuristics and capped, methodology/conclusion stay empty. Embedded
//! raster images above a byte threshold are reported as figures with
//! captions discovered from nearby page text.

use std::time::Duration;

use lazy_static::lazy_static;
use lopdf::{Dictionary, Document, Object, ObjectId};
use regex::Regex;
use tracing::{debug, instrument, warn};

use paperscout_common::http::{FetchError, HttpClient};
use paperscout_config::ExtractionConfig;
use paperscout_ingestion::models::Candidate;

use crate::content::{ExtractedContent, ExtractionMethod, Figure};

const MAX_INTRO_CHARS: usize = 3000;
const MAX_CAPTION_CHARS: usize = 300;
/// Figures almost always live in the front matter; scanning further
/// mostly yields plots from appendices.
const FIGURE_SCAN_PAGES: usize = 10;

lazy_static! {
    static ref INTRO_HEADING: Regex =
        Regex::new(r"(?im)^\s*(?:1\.?|I\.?)?\s*Introduction\s*$").expect("valid regex");
    static ref NEXT_HEADING: Regex = Regex::new(
        r"(?im)^\s*(?:2\.?|II\.?)\s+\S|(?im)^\s*(?:Methodology|Methods?|Approach|Background|Related\s+Work)\b"
    )
    .expect("valid regex");
}

pub struct PdfExtractor {
    client: HttpClient,
    fetch_timeout: Duration,
    max_figures: usize,
    min_figure_bytes: usize,
}

impl PdfExtractor {
    pub fn new(client: HttpClient, config: &ExtractionConfig) -> Self {
        Self {
            client,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            max_figures: config.max_figures,
            min_figure_bytes: config.min_figure_bytes,
        }
    }

    /// Download and parse the PDF. Network failures bubble up; a PDF that
    /// downloads but fails to parse yields empty content, since retrying
    /// the same bytes cannot help.
    #[instrument(skip(self, candidate), fields(arxiv_id = %candidate.arxiv_id))]
    pub async fn extract(&self, candidate: &Candidate) -> Result<ExtractedContent, FetchError> {
        let bytes = self
            .client
            .get_bytes(&candidate.pdf_url, self.fetch_timeout)
            .await?;
        Ok(parse_pdf_content(&bytes, self.max_figures, self.min_figure_bytes))
    }
}

pub fn parse_pdf_content(bytes: &[u8], max_figures: usize, min_figure_bytes: usize) -> ExtractedContent {
    let mut content = ExtractedContent::empty(ExtractionMethod::Pdf);

    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "Failed to parse PDF");
            return content;
        }
    };

    let mut page_texts: Vec<(u32, String)> = Vec::new();
    for (&page_num, _) in &doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => page_texts.push((page_num, text)),
            Err(e) => debug!(page_num, error = %e, "No extractable text on page"),
        }
    }

    let full_text = page_texts
        .iter()
        .map(|(_, t)| t.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    content.introduction = extract_introduction(&full_text).unwrap_or_default();
    content.figures = extract_pdf_figures(&doc, &page_texts, max_figures, min_figure_bytes);
    content.full_text = full_text;
    debug!(
        pages = page_texts.len(),
        intro_chars = content.introduction.len(),
        figures = content.figures.len(),
        "Parsed PDF content"
    );
    content
}

/// Introduction body between an "Introduction" heading and the next
/// section heading, capped at 3000 characters.
pub fn extract_introduction(full_text: &str) -> Option<String> {
    let start = INTRO_HEADING.find(full_text)?;
    let rest = &full_text[start.end()..];
    let end = NEXT_HEADING.find(rest).map_or(rest.len(), |m| m.start());
    let intro = rest[..end].trim();
    if intro.is_empty() {
        return None;
    }
    Some(truncate_chars(intro, MAX_INTRO_CHARS))
}

/// Raster images on the first pages, filtered by size so logos and
/// decorations are ignored. Captions come from "Figure N" patterns in
/// the same page's text.
fn extract_pdf_figures(
    doc: &Document,
    page_texts: &[(u32, String)],
    max_figures: usize,
    min_figure_bytes: usize,
) -> Vec<Figure> {
    let mut figures = Vec::new();
    for (index, (page_num, page_id)) in doc.get_pages().into_iter().enumerate() {
        if index >= FIGURE_SCAN_PAGES || figures.len() >= max_figures {
            break;
        }
        let image_count = count_page_images(doc, page_id, min_figure_bytes);
        let page_text = page_texts
            .iter()
            .find(|(n, _)| *n == page_num)
            .map_or("", |(_, t)| t.as_str());

        for _ in 0..image_count {
            if figures.len() >= max_figures {
                break;
            }
            let number = figures.len() + 1;
            figures.push(Figure {
                number,
                caption: find_figure_caption(page_text, number),
                image_url: None,
                page: Some(page_num),
            });
        }
    }
    figures
}

/// Count image XObjects on a page whose stream is at least `min_bytes`.
fn count_page_images(doc: &Document, page_id: ObjectId, min_bytes: usize) -> usize {
    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return 0;
    };
    let Some(resources) = page_dict.get(b"Resources").ok().and_then(|o| as_dict(doc, o)) else {
        return 0;
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| as_dict(doc, o)) else {
        return 0;
    };

    let mut count = 0;
    for (_, value) in xobjects.iter() {
        let stream = match value {
            Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_stream().ok()),
            Object::Stream(s) => Some(s),
            _ => None,
        };
        let Some(stream) = stream else { continue };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map_or(false, |name| name == b"Image");
        if is_image && stream.content.len() >= min_bytes {
            count += 1;
        }
    }
    count
}

fn as_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_dict().ok()),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

/// "Figure N: caption" lookup in the page text; falls back to a bare
/// "Figure N" label.
pub fn find_figure_caption(page_text: &str, figure_num: usize) -> String {
    let pattern = format!(r"(?im)(?:Figure|Fig\.?)\s*{figure_num}\s*[:.]?\s*([^\n]+)");
    let caption = Regex::new(&pattern)
        .ok()
        .and_then(|re| {
            re.captures(page_text)
                .and_then(|c| c.get(1))
                .map(|m| truncate_chars(m.as_str().trim(), MAX_CAPTION_CHARS))
        })
        .filter(|c| !c.is_empty());
    caption.unwrap_or_else(|| format!("Figure {figure_num}"))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introduction_between_headings() {
        let text = "Some Title\n1 Introduction\nWe study flows in depth.\nMore text here.\n2 Related Work\nOther papers.";
        let intro = extract_introduction(text).unwrap();
        assert!(intro.starts_with("We study flows"));
        assert!(intro.contains("More text here."));
        assert!(!intro.contains("Other papers"));
    }

    #[test]
    fn test_introduction_roman_numerals() {
        let text = "I. Introduction\nIEEE formatted body.\nII. Background\nMore.";
        let intro = extract_introduction(text).unwrap();
        assert_eq!(intro, "IEEE formatted body.");
    }

    #[test]
    fn test_introduction_runs_to_end_without_next_heading() {
        let text = "Introduction\nOnly section in this text.";
        let intro = extract_introduction(text).unwrap();
        assert_eq!(intro, "Only section in this text.");
    }

    #[test]
    fn test_missing_introduction() {
        assert!(extract_introduction("Abstract\nNo numbered sections at all.").is_none());
    }

    #[test]
    fn test_introduction_capped_at_3000_chars() {
        let body = "x".repeat(5000);
        let text = format!("1 Introduction\n{body}\n2 Method\nrest");
        let intro = extract_introduction(&text).unwrap();
        assert_eq!(intro.chars().count(), 3000);
    }

    #[test]
    fn test_caption_found_and_prefix_stripped() {
        let page = "body text\nFigure 2: Ablation over horizon lengths.\nmore";
        assert_eq!(find_figure_caption(page, 2), "Ablation over horizon lengths.");
    }

    #[test]
    fn test_caption_fig_abbreviation() {
        let page = "Fig. 1. System overview diagram.";
        assert_eq!(find_figure_caption(page, 1), "System overview diagram.");
    }

    #[test]
    fn test_caption_default_label() {
        assert_eq!(find_figure_caption("no captions here", 3), "Figure 3");
    }

    #[test]
    fn test_caption_truncated_to_300_chars() {
        let long = format!("Figure 1: {}", "c".repeat(600));
        assert_eq!(find_figure_caption(&long, 1).chars().count(), 300);
    }

    #[test]
    fn test_garbage_bytes_yield_empty_content() {
        let content = parse_pdf_content(b"not a pdf at all", 3, 10_000);
        assert_eq!(content.method, ExtractionMethod::Pdf);
        assert!(content.is_empty());
    }
}
