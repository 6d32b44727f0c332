//! Keyword relevance heuristics.
//!
//! Word-boundary, case-insensitive matching over title + abstract +
//! category tags. Primary keywords weigh 0.4 each (capped at 1.0),
//! secondary 0.1 each (capped at 0.3); bonuses: 0.15 for a code link,
//! 0.1 per primary keyword contained in the title. Total capped at 1.0.

use regex::Regex;
use tracing::debug;

use paperscout_config::KeywordsConfig;
use paperscout_ingestion::models::Candidate;

const PRIMARY_WEIGHT: f64 = 0.4;
const SECONDARY_WEIGHT: f64 = 0.1;
const SECONDARY_CAP: f64 = 0.3;
const GITHUB_BONUS: f64 = 0.15;
const TITLE_BONUS: f64 = 0.1;

/// Which keywords matched and why — kept for logging and explanation.
#[derive(Debug, Clone, Default)]
pub struct MatchDetails {
    pub primary_matches: Vec<String>,
    pub secondary_matches: Vec<String>,
    pub has_github: bool,
    pub title_matches: usize,
}

pub struct KeywordScorer {
    primary: Vec<(String, Regex)>,
    secondary: Vec<(String, Regex)>,
    boost_github: bool,
}

impl KeywordScorer {
    pub fn new(config: &KeywordsConfig) -> Self {
        Self {
            primary: compile_patterns(&config.primary),
            secondary: compile_patterns(&config.secondary),
            boost_github: config.boost_github,
        }
    }

    /// Score in [0, 1] plus the matches that produced it.
    pub fn score(&self, candidate: &Candidate) -> (f64, MatchDetails) {
        let searchable = format!(
            "{} {} {}",
            candidate.title,
            candidate.abstract_text,
            candidate.categories.join(" ")
        )
        .to_lowercase();
        let title_lower = candidate.title.to_lowercase();

        let mut details = MatchDetails::default();

        for (keyword, pattern) in &self.primary {
            if pattern.is_match(&searchable) {
                details.primary_matches.push(keyword.clone());
            }
        }
        for (keyword, pattern) in &self.secondary {
            if pattern.is_match(&searchable) {
                details.secondary_matches.push(keyword.clone());
            }
        }

        let primary_score = (details.primary_matches.len() as f64 * PRIMARY_WEIGHT).min(1.0);
        let secondary_score =
            (details.secondary_matches.len() as f64 * SECONDARY_WEIGHT).min(SECONDARY_CAP);

        let mut bonus = 0.0;
        if self.boost_github && !candidate.github_links.is_empty() {
            details.has_github = true;
            bonus += GITHUB_BONUS;
        }

        // Title matches stack on top of the base primary score. Plain
        // containment here, not a boundary match: a keyword embedded in a
        // hyphenated or fused title term still signals topical focus.
        details.title_matches = self
            .primary
            .iter()
            .filter(|(keyword, _)| title_lower.contains(keyword.as_str()))
            .count();
        bonus += TITLE_BONUS * details.title_matches as f64;

        let score = (primary_score + secondary_score + bonus).min(1.0);
        debug!(
            arxiv_id = %candidate.arxiv_id,
            score,
            primary = details.primary_matches.len(),
            secondary = details.secondary_matches.len(),
            title_matches = details.title_matches,
            has_github = details.has_github,
            "Keyword score computed"
        );
        (score, details)
    }
}

fn compile_patterns(keywords: &[String]) -> Vec<(String, Regex)> {
    keywords
        .iter()
        .map(|kw| {
            let lower = kw.to_lowercase();
            let pattern = format!(r"\b{}\b", regex::escape(&lower));
            let regex = Regex::new(&pattern).expect("escaped keyword is a valid pattern");
            (lower, regex)
        })
        .collect()
}
