//! paperscout-extract — Tiered content extraction.
//!
//! Structured HTML (LaTeXML rendering) first, PDF text fallback second,
//! empty content last. All tiers normalize into [`ExtractedContent`].

pub mod chain;
pub mod content;
pub mod html;
pub mod pdf;

pub use chain::{ContentExtractor, ContentTier, ExtractionChain, TierOutcome};
pub use content::{ExtractedContent, ExtractionMethod, Figure};
pub use html::HtmlExtractor;
pub use pdf::PdfExtractor;
