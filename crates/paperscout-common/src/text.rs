//! Text normalization helpers used for identifier matching and cache keys.

/// Lowercase and collapse all whitespace runs to single spaces.
/// Deterministic, so trivially different renderings of the same string
/// produce the same normalized form.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`], additionally mapping punctuation to spaces. Used for
/// identity matching, where "Flow Matching." and "flow-matching" must
/// collide with "Flow Matching".
pub fn normalize_identifier(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    normalize(&cleaned)
}

/// Strip an arXiv version suffix ("2401.12345v2" → "2401.12345").
pub fn strip_version(arxiv_id: &str) -> &str {
    match arxiv_id.rfind('v') {
        Some(pos) if arxiv_id[pos + 1..].chars().all(|c| c.is_ascii_digit())
            && !arxiv_id[pos + 1..].is_empty() =>
        {
            &arxiv_id[..pos]
        }
        _ => arxiv_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Flow   Matching\tfor Robotic\nControl "), "flow matching for robotic control");
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(normalize("DEEP Learning"), normalize("deep learning"));
    }

    #[test]
    fn test_normalize_identifier_drops_punctuation() {
        assert_eq!(
            normalize_identifier("Flow-Matching for Robotic Control."),
            "flow matching for robotic control"
        );
        assert_eq!(
            normalize_identifier("Flow Matching: A Survey?"),
            normalize_identifier("flow matching a survey")
        );
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(strip_version("2401.12345v2"), "2401.12345");
        assert_eq!(strip_version("2401.12345"), "2401.12345");
        // "v" embedded in an old-style id must not be treated as a version
        assert_eq!(strip_version("cs/0112017"), "cs/0112017");
    }

    #[test]
    fn test_strip_version_trailing_v() {
        assert_eq!(strip_version("2401.12345v"), "2401.12345v");
    }
}
