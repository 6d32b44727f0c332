//! HTML-first extraction with PDF fallback.
//!
//! `TryHtml → {ok: Done, fail: TryPdf} → {ok: Done, fail: DoneEmpty}`.
//! Every path produces an `ExtractedContent`; a paper the chain cannot
//! extract is still a ranked result, just without body text.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use paperscout_common::http::{FetchError, HttpClient};
use paperscout_config::ExtractionConfig;
use paperscout_ingestion::models::Candidate;

use crate::content::{ExtractedContent, ExtractionMethod};
use crate::html::HtmlExtractor;
use crate::pdf::PdfExtractor;

/// Result of one tier attempt.
#[derive(Debug)]
pub enum TierOutcome {
    Success(ExtractedContent),
    /// Transient failure after the retry budget; the next tier may still work.
    Retryable(String),
    /// The tier can never produce content for this candidate (404, no
    /// introduction in the rendering).
    Fatal(String),
}

/// One extraction tier behind a seam, so the chain's transitions can be
/// driven in tests without the network.
#[async_trait]
pub trait ContentTier: Send + Sync {
    /// Whether the tier is worth attempting for this candidate.
    async fn available(&self, candidate: &Candidate) -> bool;

    async fn fetch(&self, candidate: &Candidate) -> Result<ExtractedContent, FetchError>;
}

#[async_trait]
impl ContentTier for HtmlExtractor {
    async fn available(&self, candidate: &Candidate) -> bool {
        self.probe(&HtmlExtractor::html_url(candidate)).await
    }

    async fn fetch(&self, candidate: &Candidate) -> Result<ExtractedContent, FetchError> {
        self.extract(candidate).await
    }
}

#[async_trait]
impl ContentTier for PdfExtractor {
    /// Every paper has a PDF URL; availability is only learned by fetching.
    async fn available(&self, _candidate: &Candidate) -> bool {
        true
    }

    async fn fetch(&self, candidate: &Candidate) -> Result<ExtractedContent, FetchError> {
        self.extract(candidate).await
    }
}

/// Seam for the orchestrator, so pipeline tests can swap in a canned
/// extractor instead of the network.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, candidate: &Candidate) -> ExtractedContent;
}

pub struct ExtractionChain<H = HtmlExtractor, P = PdfExtractor> {
    html: H,
    pdf: P,
}

impl ExtractionChain {
    pub fn new(client: HttpClient, config: &ExtractionConfig) -> Self {
        Self {
            html: HtmlExtractor::new(client.clone(), config),
            pdf: PdfExtractor::new(client, config),
        }
    }
}

impl<H: ContentTier, P: ContentTier> ExtractionChain<H, P> {
    pub fn with_tiers(html: H, pdf: P) -> Self {
        Self { html, pdf }
    }

    /// HTML succeeds only when it yields an introduction; a rendering
    /// without one usually means LaTeXML choked on the paper, and the PDF
    /// tends to do better.
    async fn try_html(&self, candidate: &Candidate) -> TierOutcome {
        if !self.html.available(candidate).await {
            return TierOutcome::Fatal("HTML rendering not available".to_string());
        }
        match self.html.fetch(candidate).await {
            Ok(content) if !content.introduction.is_empty() => TierOutcome::Success(content),
            Ok(_) => TierOutcome::Fatal("HTML available but no introduction extracted".to_string()),
            Err(FetchError::NotFound) => TierOutcome::Fatal("HTML rendering returned 404".to_string()),
            Err(e) => TierOutcome::Retryable(e.to_string()),
        }
    }

    async fn try_pdf(&self, candidate: &Candidate) -> TierOutcome {
        if !self.pdf.available(candidate).await {
            return TierOutcome::Fatal("PDF not available".to_string());
        }
        match self.pdf.fetch(candidate).await {
            Ok(content) => TierOutcome::Success(content),
            Err(FetchError::NotFound) => TierOutcome::Fatal("PDF returned 404".to_string()),
            Err(e) => TierOutcome::Retryable(e.to_string()),
        }
    }
}

#[async_trait]
impl<H: ContentTier, P: ContentTier> ContentExtractor for ExtractionChain<H, P> {
    #[instrument(skip(self, candidate), fields(arxiv_id = %candidate.arxiv_id))]
    async fn extract(&self, candidate: &Candidate) -> ExtractedContent {
        match self.try_html(candidate).await {
            TierOutcome::Success(content) => {
                info!(figures = content.figures.len(), "Extracted via HTML tier");
                return content;
            }
            TierOutcome::Retryable(reason) | TierOutcome::Fatal(reason) => {
                info!(reason, "HTML tier unusable, falling back to PDF");
            }
        }
        match self.try_pdf(candidate).await {
            TierOutcome::Success(content) => {
                info!(figures = content.figures.len(), "Extracted via PDF tier");
                content
            }
            TierOutcome::Retryable(reason) | TierOutcome::Fatal(reason) => {
                warn!(reason, "Both extraction tiers failed");
                ExtractedContent::empty(ExtractionMethod::Pdf)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tier with a scripted response and a fetch counter.
    struct CannedTier {
        available: bool,
        response: Canned,
        fetches: AtomicUsize,
    }

    enum Canned {
        Content(ExtractedContent),
        NotFound,
        Timeout,
    }

    impl CannedTier {
        fn new(available: bool, response: Canned) -> Self {
            Self {
                available,
                response,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentTier for CannedTier {
        async fn available(&self, _candidate: &Candidate) -> bool {
            self.available
        }

        async fn fetch(&self, _candidate: &Candidate) -> Result<ExtractedContent, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Canned::Content(content) => Ok(content.clone()),
                Canned::NotFound => Err(FetchError::NotFound),
                Canned::Timeout => Err(FetchError::Timeout),
            }
        }
    }

    fn html_content(introduction: &str) -> ExtractedContent {
        let mut content = ExtractedContent::empty(ExtractionMethod::Html);
        content.introduction = introduction.to_string();
        content
    }

    fn pdf_content() -> ExtractedContent {
        let mut content = ExtractedContent::empty(ExtractionMethod::Pdf);
        content.introduction = "pdf introduction".to_string();
        content
    }

    fn candidate() -> Candidate {
        Candidate {
            arxiv_id: "2401.12345".to_string(),
            doi: None,
            title: "Some Paper".to_string(),
            abstract_text: String::new(),
            authors: vec![],
            published_at: Utc::now(),
            categories: vec![],
            abs_url: "https://arxiv.org/abs/2401.12345".to_string(),
            pdf_url: "https://arxiv.org/pdf/2401.12345".to_string(),
            html_url: None,
            github_links: vec![],
        }
    }

    #[tokio::test]
    async fn test_html_success_skips_pdf() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(true, Canned::Content(html_content("intro text"))),
            CannedTier::new(true, Canned::Content(pdf_content())),
        );
        let content = chain.extract(&candidate()).await;
        assert_eq!(content.method, ExtractionMethod::Html);
        assert_eq!(content.introduction, "intro text");
        assert_eq!(chain.pdf.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_html_timeout_falls_back_to_pdf() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(true, Canned::Timeout),
            CannedTier::new(true, Canned::Content(pdf_content())),
        );
        let content = chain.extract(&candidate()).await;
        assert_eq!(content.method, ExtractionMethod::Pdf);
        assert!(content.methodology.is_empty());
        assert_eq!(content.introduction, "pdf introduction");
    }

    #[tokio::test]
    async fn test_html_without_introduction_falls_back() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(true, Canned::Content(html_content(""))),
            CannedTier::new(true, Canned::Content(pdf_content())),
        );
        let content = chain.extract(&candidate()).await;
        assert_eq!(content.method, ExtractionMethod::Pdf);
        assert_eq!(chain.html.fetch_count(), 1);
        assert_eq!(chain.pdf.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_html_never_fetched() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(false, Canned::Content(html_content("unreachable"))),
            CannedTier::new(true, Canned::Content(pdf_content())),
        );
        let content = chain.extract(&candidate()).await;
        assert_eq!(content.method, ExtractionMethod::Pdf);
        assert_eq!(chain.html.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_both_tiers_failing_yield_empty_content() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(true, Canned::NotFound),
            CannedTier::new(true, Canned::Timeout),
        );
        let content = chain.extract(&candidate()).await;
        assert_eq!(content.method, ExtractionMethod::Pdf);
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_pdf_not_found_yields_empty_content() {
        let chain = ExtractionChain::with_tiers(
            CannedTier::new(false, Canned::NotFound),
            CannedTier::new(true, Canned::NotFound),
        );
        let content = chain.extract(&candidate()).await;
        assert!(content.is_empty());
    }
}
