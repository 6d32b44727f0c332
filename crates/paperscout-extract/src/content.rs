//! Normalized extraction output shared by both tiers.

use serde::{Deserialize, Serialize};

/// Which tier produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Html,
    Pdf,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Html => "html",
            ExtractionMethod::Pdf => "pdf",
        }
    }
}

/// One extracted figure. The HTML tier records the resolved image URL;
/// the PDF tier records the page the image was embedded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub number: usize,
    pub caption: String,
    pub image_url: Option<String>,
    pub page: Option<u32>,
}

/// Uniform output regardless of tier. Sections the tier cannot produce
/// are empty strings, never absent, so downstream formatting stays flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub method: ExtractionMethod,
    pub introduction: String,
    pub methodology: String,
    pub conclusion: String,
    pub figures: Vec<Figure>,
    pub full_text: String,
}

impl ExtractedContent {
    pub fn empty(method: ExtractionMethod) -> Self {
        Self {
            method,
            introduction: String::new(),
            methodology: String::new(),
            conclusion: String::new(),
            figures: Vec::new(),
            full_text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.introduction.is_empty()
            && self.methodology.is_empty()
            && self.conclusion.is_empty()
            && self.figures.is_empty()
            && self.full_text.is_empty()
    }

    /// Labeled concatenation of the non-empty sections, used as the
    /// single-string view for downstream consumers.
    pub fn assemble_full_text(&mut self) {
        let mut parts = Vec::new();
        if !self.introduction.is_empty() {
            parts.push(format!("Introduction:\n{}", self.introduction));
        }
        if !self.methodology.is_empty() {
            parts.push(format!("Methodology:\n{}", self.methodology));
        }
        if !self.conclusion.is_empty() {
            parts.push(format!("Conclusion:\n{}", self.conclusion));
        }
        self.full_text = parts.join("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_is_empty() {
        assert!(ExtractedContent::empty(ExtractionMethod::Html).is_empty());
    }

    #[test]
    fn test_full_text_skips_empty_sections() {
        let mut content = ExtractedContent::empty(ExtractionMethod::Html);
        content.introduction = "We study flows.".to_string();
        content.conclusion = "Flows work.".to_string();
        content.assemble_full_text();
        assert_eq!(
            content.full_text,
            "Introduction:\nWe study flows.\n\nConclusion:\nFlows work."
        );
        assert!(!content.full_text.contains("Methodology"));
    }
}
