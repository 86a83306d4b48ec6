//! Relevance and monetary-content classification for a single article.
//!
//! Both checks are pure functions over the title and description text.

use once_cell::sync::Lazy;
use regex::Regex;

/// `$` amounts with up to two decimals, or a plain / comma-grouped number
/// (optionally with exactly two decimals) followed by " dollars" or " USD".
/// Case-sensitive.
pub const MONEY_PATTERN: &str =
    r"\$\d+(\.\d{1,2})?|(\d+|\d{1,3}(,\d{3})*)(\.\d{2})? (dollars|USD)";

static MONEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(MONEY_PATTERN).unwrap());

/// Case-insensitive, non-overlapping count of `phrase` in title plus description.
///
/// An empty phrase matches nothing and counts as zero.
pub fn count_occurrences(phrase: &str, title: &str, description: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    let needle = phrase.to_lowercase();
    [title, description]
        .iter()
        .map(|text| text.to_lowercase().matches(needle.as_str()).count())
        .sum()
}

/// `true` when either field contains a monetary amount.
pub fn detect_money(title: &str, description: &str) -> bool {
    MONEY_RE.is_match(title) || MONEY_RE.is_match(description)
}

/// Result of classifying one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub search_count: usize,
    pub contains_money: bool,
}

/// Classifier bound to the run's search phrase.
#[derive(Debug, Clone)]
pub struct PhraseAnalyzer {
    phrase: String,
}

impl PhraseAnalyzer {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn classify(&self, title: &str, description: &str) -> Classification {
        Classification {
            search_count: count_occurrences(&self.phrase, title, description),
            contains_money: detect_money(title, description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_case_insensitive() {
        assert_eq!(count_occurrences("Gold", "Gold price rises", "gold falls"), 2);
    }

    #[test]
    fn test_count_is_non_overlapping() {
        assert_eq!(count_occurrences("aa", "aaaa", ""), 2);
        assert_eq!(count_occurrences("aa", "aaa", "AAA"), 2);
    }

    #[test]
    fn test_count_empty_phrase_is_zero() {
        assert_eq!(count_occurrences("", "anything", "at all"), 0);
    }

    #[test]
    fn test_count_empty_text_is_zero() {
        assert_eq!(count_occurrences("gold", "", ""), 0);
    }

    #[test]
    fn test_count_multiword_phrase() {
        assert_eq!(
            count_occurrences("interest rates", "Interest Rates climb", "fed holds interest rates"),
            2
        );
    }

    #[test]
    fn test_money_positive_cases() {
        assert!(detect_money("$5.00", ""));
        assert!(detect_money("$5", ""));
        assert!(detect_money("costs $12.5 now", ""));
        assert!(detect_money("", "1,000 dollars"));
        assert!(detect_money("50 USD", ""));
        assert!(detect_money("", "raised 2,500,000.00 dollars"));
        assert!(detect_money("fine of 19.99 USD", ""));
    }

    #[test]
    fn test_money_negative_cases() {
        assert!(!detect_money("five dollars worth", ""));
        assert!(!detect_money("", ""));
        assert!(!detect_money("$ 5", "no numbers here"));
        assert!(!detect_money("50usd", ""));
    }

    #[test]
    fn test_money_unit_is_case_sensitive() {
        assert!(!detect_money("50 Dollars", ""));
        assert!(!detect_money("50 usd", ""));
    }

    #[test]
    fn test_money_checks_both_fields() {
        assert!(detect_money("Budget talks", "a $300 shortfall"));
        assert!(detect_money("A $300 shortfall", "Budget talks"));
    }

    #[test]
    fn test_analyzer_classifies() {
        let analyzer = PhraseAnalyzer::new("budget");
        let c = analyzer.classify("Budget vote", "The budget adds 40 USD per head");
        assert_eq!(c.search_count, 2);
        assert!(c.contains_money);
        assert_eq!(analyzer.phrase(), "budget");
    }
}
