//! Highlighting of search terms within a phrase.

use std::ops::Range;

use crate::fuzzy::FuzzySearchTerm;
use crate::highlight::{HIGHLIGHT_END, HIGHLIGHT_START};
use crate::util::normalize::fold_for_matching;

/// Terms shorter than this are never highlighted.
pub const MIN_TERM_LENGTH: usize = 2;

/// A search term prepared for matching.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    /// Folded characters, matched as a substring of the folded phrase.
    Folded(Vec<char>),
    Fuzzy(FuzzySearchTerm),
}

impl Matcher {
    /// Prepare a raw search term. Returns `None` for terms too short to
    /// highlight.
    pub(crate) fn new(term: &str) -> Option<Self> {
        let term = term.trim();
        if let Some(fuzzy) = FuzzySearchTerm::parse(term) {
            return (fuzzy.term().chars().count() >= MIN_TERM_LENGTH).then_some(Matcher::Fuzzy(fuzzy));
        }

        let bare = term.trim_matches(|c: char| c == '"' || c == '*');
        let folded = fold_for_matching(bare);
        let start = folded.iter().position(|c| *c != ' ')?;
        let end = folded.iter().rposition(|c| *c != ' ')? + 1;
        let folded = folded[start..end].to_vec();
        (folded.len() >= MIN_TERM_LENGTH).then_some(Matcher::Folded(folded))
    }

    /// Byte ranges of all non-overlapping matches in `text`.
    pub(crate) fn find_in(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Matcher::Fuzzy(fuzzy) => fuzzy.find_in(text),
            Matcher::Folded(term) => {
                let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
                let folded = fold_for_matching(text);
                let mut ranges = Vec::new();
                let mut i = 0;
                while i + term.len() <= folded.len() {
                    if folded[i..i + term.len()] == term[..] {
                        let end = offsets.get(i + term.len()).copied().unwrap_or(text.len());
                        ranges.push(offsets[i]..end);
                        i += term.len();
                    } else {
                        i += 1;
                    }
                }
                ranges
            }
        }
    }
}

/// Apply `f` to every part of `phrase` outside highlight sentinels.
fn map_unmarked<F>(phrase: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut result = String::with_capacity(phrase.len() + 32);
    let mut rest = phrase;
    while let Some(start) = rest.find(HIGHLIGHT_START) {
        result.push_str(&f(&rest[..start]));
        let marked = &rest[start..];
        match marked.find(HIGHLIGHT_END) {
            Some(end) => {
                let end = end + HIGHLIGHT_END.len();
                result.push_str(&marked[..end]);
                rest = &marked[end..];
            }
            None => {
                result.push_str(marked);
                return result;
            }
        }
    }
    result.push_str(&f(rest));
    result
}

fn highlight_ranges(text: &str, ranges: &[Range<usize>]) -> String {
    let mut result = String::with_capacity(text.len() + ranges.len() * 14);
    let mut last = 0;
    for range in ranges {
        result.push_str(&text[last..range.start]);
        result.push_str(HIGHLIGHT_START);
        result.push_str(&text[range.clone()]);
        result.push_str(HIGHLIGHT_END);
        last = range.end;
    }
    result.push_str(&text[last..]);
    result
}

fn highlight_term(phrase: &str, matcher: &Matcher) -> String {
    map_unmarked(phrase, |segment| {
        highlight_ranges(segment, &matcher.find_in(segment))
    })
}

/// Wrap every occurrence of the given terms in highlight sentinels.
///
/// Matching ignores case and diacritics, the returned text keeps the
/// original characters. Fuzzy terms (`word~N`) match by edit distance. Text
/// already inside sentinels is never matched again, so highlighting is
/// idempotent.
pub fn apply_highlighting_to_phrase(phrase: &str, terms: &[String]) -> String {
    match terms.split_first() {
        None => phrase.to_string(),
        Some((term, rest)) => {
            let highlighted = match Matcher::new(term) {
                Some(matcher) => highlight_term(phrase, &matcher),
                None => phrase.to_string(),
            };
            apply_highlighting_to_phrase(&highlighted, rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_original_text() {
        assert_eq!(
            apply_highlighting_to_phrase("Ein Vogel über Würzburg", &terms(&["wurzburg"])),
            "Ein Vogel über ##HLS##Würzburg##HLE##"
        );
        assert_eq!(
            apply_highlighting_to_phrase("Birds and BIRDS", &terms(&["bird*"])),
            "##HLS##Bird##HLE##s and ##HLS##BIRD##HLE##S"
        );
    }

    #[test]
    fn test_term_not_present() {
        let phrase = "A red-winged blackbird";
        assert_eq!(apply_highlighting_to_phrase(phrase, &terms(&["owl"])), phrase);
    }

    #[test]
    fn test_short_terms_ignored() {
        let phrase = "a b c";
        assert_eq!(apply_highlighting_to_phrase(phrase, &terms(&["a", "*b*"])), phrase);
    }

    #[test]
    fn test_idempotent() {
        let t = terms(&["bird", "birds", "red bird"]);
        let once = apply_highlighting_to_phrase("The red birds sing", &t);
        let twice = apply_highlighting_to_phrase(&once, &t);
        assert_eq!(once, twice);
        assert_eq!(once.matches(HIGHLIGHT_START).count(), once.matches(HIGHLIGHT_END).count());
    }

    #[test]
    fn test_phrase_term() {
        assert_eq!(
            apply_highlighting_to_phrase("the Red  Bird flies", &terms(&["\"red bird\""])),
            "the Red  Bird flies"
        );
        assert_eq!(
            apply_highlighting_to_phrase("the Red Bird flies", &terms(&["\"red bird\""])),
            "the ##HLS##Red Bird##HLE## flies"
        );
    }

    #[test]
    fn test_fuzzy_term() {
        assert_eq!(
            apply_highlighting_to_phrase("Ein Fahrrat und ein Auto", &terms(&["fahrrad~1"])),
            "Ein ##HLS##Fahrrat##HLE## und ein Auto"
        );
    }

    #[test]
    fn test_marker_text_is_not_matched() {
        let phrase = "##HLS##bird##HLE## hls";
        assert_eq!(
            apply_highlighting_to_phrase(phrase, &terms(&["hls"])),
            "##HLS##bird##HLE## ##HLS##hls##HLE##"
        );
    }
}
