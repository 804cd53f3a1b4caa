//! Edit-distance tolerant term matching.
//!
//! A fuzzy term is written `*word*~N`: optional leading and trailing
//! truncation wildcards, the word itself and the maximum edit distance. OCR
//! errors and typing mistakes within that distance still count as a match.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::util::levenshtein::within_distance;
use crate::util::normalize::clean_word;

lazy_static! {
    static ref FUZZY_TERM: Regex =
        Regex::new(r"^(\*)?([^*~\s]+)(\*)?~(\d)$").expect("fuzzy term pattern is valid");
    static ref IGNORE_DISTANCE: Regex =
        Regex::new(r"^[\d\s.,:;/+-]+$").expect("numeric term pattern is valid");
}

/// A search term annotated with a maximum edit distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzySearchTerm {
    /// The term as typed, including wildcards and distance suffix.
    full_term: String,
    /// The cleaned word without wildcards or suffix.
    term: String,
    /// Maximum number of edits tolerated.
    max_distance: usize,
    /// Whether arbitrary text may precede the word.
    wildcard_front: bool,
    /// Whether arbitrary text may follow the word.
    wildcard_back: bool,
}

impl FuzzySearchTerm {
    /// Parse a fuzzy term. Returns `None` if `term` does not follow the
    /// `*word*~N` syntax.
    pub fn parse(term: &str) -> Option<Self> {
        let captures = FUZZY_TERM.captures(term.trim())?;
        let word = captures.get(2)?.as_str();
        let max_distance = captures.get(4)?.as_str().parse().ok()?;

        Some(FuzzySearchTerm {
            full_term: term.trim().to_string(),
            term: clean_word(word),
            max_distance,
            wildcard_front: captures.get(1).is_some(),
            wildcard_back: captures.get(3).is_some(),
        })
    }

    /// Create a fuzzy term from a plain word, choosing the distance with
    /// [`calculate_optimal_distance`].
    pub fn with_optimal_distance(word: &str) -> Self {
        let wildcard_front = word.starts_with('*');
        let wildcard_back = word.len() > 1 && word.ends_with('*');
        let bare = word.trim_matches('*');
        let max_distance = calculate_optimal_distance(bare);

        FuzzySearchTerm {
            full_term: format!("{word}~{max_distance}"),
            term: clean_word(bare),
            max_distance,
            wildcard_front,
            wildcard_back,
        }
    }

    /// The term as originally written.
    pub fn full_term(&self) -> &str {
        &self.full_term
    }

    /// The cleaned word that is compared against text.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Maximum edit distance.
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Whether a leading wildcard was given.
    pub fn wildcard_front(&self) -> bool {
        self.wildcard_front
    }

    /// Whether a trailing wildcard was given.
    pub fn wildcard_back(&self) -> bool {
        self.wildcard_back
    }

    /// Check whether `text` (a single word) matches this term.
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = clean_word(text).chars().collect();
        let term: Vec<char> = self.term.chars().collect();
        if text.is_empty() || term.is_empty() {
            return false;
        }

        if !self.wildcard_front && !self.wildcard_back {
            return within_distance(&text, &term, self.max_distance);
        }

        let min_len = term.len().saturating_sub(self.max_distance).max(1);
        let max_len = (term.len() + self.max_distance).min(text.len());
        for window_len in min_len..=max_len {
            let last_start = text.len() - window_len;
            let starts = match (self.wildcard_front, self.wildcard_back) {
                (true, true) => 0..=last_start,
                (true, false) => last_start..=last_start,
                _ => 0..=0,
            };
            for start in starts {
                let window = &text[start..start + window_len];
                if within_distance(window, &term, self.max_distance) {
                    return true;
                }
            }
        }

        false
    }

    /// Find the byte ranges of all words in `text` matching this term.
    pub fn find_in(&self, text: &str) -> Vec<Range<usize>> {
        text.unicode_word_indices()
            .filter(|(_, word)| self.matches(word))
            .map(|(start, word)| start..start + word.len())
            .collect()
    }
}

/// Check whether `term` is written as a fuzzy term (`*word*~N`).
pub fn is_fuzzy_term(term: &str) -> bool {
    FUZZY_TERM.is_match(term.trim())
}

/// Choose an edit distance for a term based on its length.
///
/// Blank, numeric and very short terms get no tolerance at all, since a
/// single edit on them produces too many false positives.
pub fn calculate_optimal_distance(term: &str) -> usize {
    let term = term.trim();
    if term.is_empty() || IGNORE_DISTANCE.is_match(term) {
        return 0;
    }
    match term.chars().count() {
        0..=3 => 0,
        4..=8 => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fuzzy_term() {
        assert!(is_fuzzy_term("color~1"));
        assert!(is_fuzzy_term("*color~1"));
        assert!(is_fuzzy_term("*color*~2"));
        assert!(!is_fuzzy_term("color"));
        assert!(!is_fuzzy_term("color~"));
        assert!(!is_fuzzy_term("col or~1"));
        assert!(!is_fuzzy_term("color~12"));
    }

    #[test]
    fn test_calculate_optimal_distance() {
        assert_eq!(calculate_optimal_distance(""), 0);
        assert_eq!(calculate_optimal_distance("  "), 0);
        assert_eq!(calculate_optimal_distance("12345"), 0);
        assert_eq!(calculate_optimal_distance("cat"), 0);
        assert_eq!(calculate_optimal_distance("bird"), 1);
        assert_eq!(calculate_optimal_distance("bicycle"), 1);
        assert_eq!(calculate_optimal_distance("vineyards"), 2);
        assert_eq!(calculate_optimal_distance("international"), 2);
    }

    #[test]
    fn test_parse() {
        let term = FuzzySearchTerm::parse("*Colour*~1").unwrap();
        assert_eq!(term.term(), "colour");
        assert_eq!(term.full_term(), "*Colour*~1");
        assert_eq!(term.max_distance(), 1);
        assert!(term.wildcard_front());
        assert!(term.wildcard_back());

        assert!(FuzzySearchTerm::parse("colour").is_none());
    }

    #[test]
    fn test_matches_without_wildcards() {
        let term = FuzzySearchTerm::parse("colour~1").unwrap();
        assert!(term.matches("color"));
        assert!(term.matches("Colour,"));
        assert!(term.matches("Cöløur"));
        assert!(!term.matches("col"));
        assert!(!term.matches("watercolour"));
    }

    #[test]
    fn test_matches_with_wildcards() {
        let front = FuzzySearchTerm::parse("*colour~1").unwrap();
        assert!(front.matches("watercolor"));
        assert!(!front.matches("colourful"));

        let back = FuzzySearchTerm::parse("colour*~1").unwrap();
        assert!(back.matches("colorful"));
        assert!(!back.matches("watercolour"));

        let both = FuzzySearchTerm::parse("*colour*~1").unwrap();
        assert!(both.matches("watercolorpainting"));
    }

    #[test]
    fn test_matches_ocr_hyphenation() {
        let term = FuzzySearchTerm::parse("fahrrad~1").unwrap();
        assert!(term.matches("Fahr¬rad"));
        assert!(term.matches("Fahrrat"));
    }

    #[test]
    fn test_find_in() {
        let term = FuzzySearchTerm::parse("bicycle~1").unwrap();
        let text = "A bycicle, a bicycle and a tricycle.";
        let ranges = term.find_in(text);
        let words: Vec<&str> = ranges.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(words, vec!["bicycle"]);

        let term = FuzzySearchTerm::with_optimal_distance("bicycle");
        assert_eq!(term.max_distance(), 1);
    }
}
