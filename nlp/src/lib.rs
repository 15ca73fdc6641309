//! Shared keyword-extraction logic. `Searcher`'s filename fallback
//! (spec.md §4.8), the agent's follow-up coverage check (§4.10.1), and
//! `Router`'s attribute-hint extraction (§4.6) all tokenize and drop
//! stopwords the same way — this crate is the one place that logic
//! lives so the three components can't silently drift apart.

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in", "on",
    "for", "with", "at", "by", "from", "about", "as", "into", "like", "through", "after", "over",
    "between", "out", "against", "during", "without", "before", "under", "around", "among", "and",
    "or", "but", "if", "then", "do", "does", "did", "have", "has", "had", "i", "you", "he", "she",
    "it", "we", "they", "my", "your", "his", "her", "its", "our", "their", "this", "that", "these",
    "those", "what", "which", "who", "whom", "how", "any", "all", "there", "can", "will", "would",
    "should", "could", "me", "us", "them",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token.to_lowercase().as_str())
}

/// Lowercase, alphanumeric-only tokenization.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Tokenize, drop stopwords, drop tokens of length <= 2 (spec.md §4.8
/// step 5 / §4.10.1).
pub fn extract_keywords(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.len() > 2 && !is_stopword(t))
        .collect()
}

/// Fraction of `keywords` that appear as a substring somewhere in
/// `haystack` (case-insensitive). Used for the agent's follow-up
/// coverage check.
pub fn missing_keywords(keywords: &[String], haystack: &str) -> Vec<String> {
    let haystack = haystack.to_lowercase();
    keywords
        .iter()
        .filter(|k| !haystack.contains(k.as_str()))
        .cloned()
        .collect()
}

/// The last non-stopword token in `text`, for `Router`'s file-attribute
/// hint extraction (spec.md §4.6 step 3).
pub fn last_non_stopword_token(text: &str) -> Option<String> {
    tokenize(text).into_iter().rev().find(|t| !is_stopword(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stopwords_and_short_tokens() {
        let keywords = extract_keywords("any macbook pdfs in the folder");
        assert_eq!(keywords, vec!["macbook", "pdfs", "folder"]);
    }

    #[test]
    fn missing_keywords_reports_unmatched() {
        let missing = missing_keywords(
            &["macbook".to_string(), "invoice".to_string()],
            "Found 25 .pdf files.",
        );
        assert_eq!(missing, vec!["macbook".to_string(), "invoice".to_string()]);
    }

    #[test]
    fn last_non_stopword_token_skips_trailing_stopwords() {
        assert_eq!(
            last_non_stopword_token("how big is report.pdf"),
            Some("pdf".to_string())
        );
    }
}
