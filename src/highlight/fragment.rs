//! Extraction of highlighted fragments from long full texts.

use std::ops::Range;

use rand::Rng;

use crate::highlight::HighlightConfig;
use crate::highlight::phrase::{Matcher, apply_highlighting_to_phrase};

/// Cut an unclosed tag at the end and a dangling tag tail at the start.
fn repair_markup(fragment: &str) -> &str {
    let mut fragment = fragment;
    if let Some(open) = fragment.rfind('<') {
        if !fragment[open..].contains('>') {
            fragment = &fragment[..open];
        }
    }
    if let Some(close) = fragment.find('>') {
        if !fragment[..close].contains('<') {
            fragment = &fragment[close + 1..];
        }
    }
    fragment.trim()
}

fn clean_fulltext(fulltext: &str) -> String {
    fulltext
        .replace("<br />", " ")
        .replace("<br/>", " ")
        .replace("<br>", " ")
        .replace(['\n', '\r', '\t'], " ")
}

/// Terms usable for fragment search: wildcards, quotes and stopwords removed.
fn prepare_terms(config: &HighlightConfig, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|term| {
            term.trim()
                .trim_matches(|c: char| c == '*' || c == '"')
                .to_string()
        })
        .filter(|term| !term.is_empty() && !config.is_stopword(term))
        .collect()
}

/// Pick a window of about `target_len` characters containing `hit`.
///
/// The match lands at a random position inside the window. Window borders are
/// moved to the nearest whitespace so that no word is cut.
fn window_around<R: Rng>(chars: &[char], hit: Range<usize>, target_len: usize, rng: &mut R) -> Range<usize> {
    let hit_len = hit.end - hit.start;
    let slack = target_len.saturating_sub(hit_len);
    let before = if slack == 0 { 0 } else { rng.random_range(0..=slack) };

    let mut start = hit.start.saturating_sub(before);
    let mut end = (start + target_len.max(hit_len)).min(chars.len());
    if end - start < target_len {
        start = end.saturating_sub(target_len);
    }

    if start > 0 {
        if let Some(space) = chars[start..hit.start].iter().position(|c| c.is_whitespace()) {
            start += space + 1;
        }
    }
    if end < chars.len() {
        if let Some(space) = chars[hit.end..end].iter().rposition(|c| c.is_whitespace()) {
            end = hit.end + space;
        }
    }
    start..end
}

/// Char ranges of all matches of the prepared terms, in text order.
fn find_hits(text: &str, terms: &[String]) -> Vec<Range<usize>> {
    let byte_ranges: Vec<Range<usize>> = terms
        .iter()
        .filter_map(|term| Matcher::new(term))
        .flat_map(|matcher| matcher.find_in(text))
        .collect();

    let mut offsets: Vec<usize> = byte_ranges.iter().flat_map(|r| [r.start, r.end]).collect();
    offsets.sort_unstable();
    offsets.dedup();
    let char_offsets = chars_before(text, &offsets);
    let byte_to_char = |byte: usize| {
        offsets
            .binary_search(&byte)
            .map_or(0, |i| char_offsets[i])
    };

    let mut hits: Vec<Range<usize>> = byte_ranges
        .into_iter()
        .map(|range| byte_to_char(range.start)..byte_to_char(range.end))
        .collect();
    hits.sort_by_key(|r| (r.start, r.end));
    hits
}

/// Number of chars before each of the sorted byte `offsets`, in one pass
/// over `text`.
fn chars_before(text: &str, offsets: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(offsets.len());
    let mut pending = offsets.iter().peekable();
    let mut count = 0;
    for (byte, _) in text.char_indices() {
        while pending.next_if(|&&offset| offset <= byte).is_some() {
            result.push(count);
        }
        if pending.peek().is_none() {
            break;
        }
        count += 1;
    }
    result.resize(offsets.len(), count);
    result
}

/// [`truncate_fulltext_with_rng`] using the thread-local random generator.
pub fn truncate_fulltext(
    config: &HighlightConfig,
    terms: &[String],
    fulltext: &str,
    target_len: usize,
    first_match_only: bool,
    add_fragment_if_no_match: bool,
) -> Vec<String> {
    truncate_fulltext_with_rng(
        config,
        terms,
        fulltext,
        target_len,
        first_match_only,
        add_fragment_if_no_match,
        &mut rand::rng(),
    )
}

/// Cut highlighted fragments of about `target_len` characters around the
/// search term matches in `fulltext`.
///
/// Returns one fragment per match, skipping matches already covered by the
/// previous fragment. With `first_match_only` only the first fragment is
/// returned. If nothing matches and `add_fragment_if_no_match` is set, the
/// head of the text is returned instead. Fragments carry highlight sentinels.
pub fn truncate_fulltext_with_rng<R: Rng>(
    config: &HighlightConfig,
    terms: &[String],
    fulltext: &str,
    target_len: usize,
    first_match_only: bool,
    add_fragment_if_no_match: bool,
    rng: &mut R,
) -> Vec<String> {
    let text = clean_fulltext(fulltext);
    if text.trim().is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let terms = prepare_terms(config, terms);

    let mut fragments = Vec::new();
    let mut covered_until = 0;
    for hit in find_hits(&text, &terms) {
        if hit.start < covered_until {
            continue;
        }
        let window = window_around(&chars, hit, target_len, rng);
        covered_until = window.end;

        let raw: String = chars[window].iter().collect();
        let fragment = apply_highlighting_to_phrase(repair_markup(&raw), &terms);
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
        if first_match_only && !fragments.is_empty() {
            break;
        }
    }

    if fragments.is_empty() && add_fragment_if_no_match {
        let mut end = target_len.min(chars.len());
        if end < chars.len() {
            if let Some(space) = chars[..end].iter().rposition(|c| c.is_whitespace()) {
                end = space;
            }
        }
        let head: String = chars[..end].iter().collect();
        let head = repair_markup(&head);
        if !head.is_empty() {
            fragments.push(head.to_string());
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::highlight::{HIGHLIGHT_END, HIGHLIGHT_START, strip_markers};

    const TEXT: &str = "In the spring the meadow is full of life. A small bird sits on the \
        fence and sings. Later that day the farmer walks past the old barn, where another \
        bird has built its nest under the roof. Nobody knows how long it will stay.";

    fn terms(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_fragment_per_match() {
        let config = HighlightConfig::new();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let fragments =
                truncate_fulltext_with_rng(&config, &terms(&["bird"]), TEXT, 40, false, false, &mut rng);
            assert_eq!(fragments.len(), 2, "seed {seed}");
            for fragment in &fragments {
                assert_eq!(fragment.matches(HIGHLIGHT_START).count(), 1);
                assert!(fragment.contains("##HLS##bird##HLE##"));
                let plain = strip_markers(fragment);
                assert!(plain.chars().count() <= 40, "seed {seed}: {plain}");
                assert!(TEXT.contains(&plain), "seed {seed}: {plain}");
            }
        }
    }

    #[test]
    fn test_first_match_only() {
        let config = HighlightConfig::new();
        let mut rng = StdRng::seed_from_u64(3);
        let fragments =
            truncate_fulltext_with_rng(&config, &terms(&["*bird*"]), TEXT, 60, true, false, &mut rng);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("##HLS##bird##HLE##"));
        assert!(!strip_markers(&fragments[0]).contains("nest"));
    }

    #[test]
    fn test_no_match_fallback() {
        let config = HighlightConfig::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(
            truncate_fulltext_with_rng(&config, &terms(&["owl"]), TEXT, 30, false, false, &mut rng)
                .is_empty()
        );
        let fragments =
            truncate_fulltext_with_rng(&config, &terms(&["owl"]), TEXT, 30, false, true, &mut rng);
        assert_eq!(fragments, vec!["In the spring the meadow is".to_string()]);
    }

    #[test]
    fn test_stopwords_are_not_searched() {
        let config = HighlightConfig::new().stopwords(["the"]);
        let mut rng = StdRng::seed_from_u64(1);
        let fragments =
            truncate_fulltext_with_rng(&config, &terms(&["the"]), TEXT, 30, false, false, &mut rng);
        assert!(fragments.is_empty());
    }

    #[test]
    fn test_markup_repair() {
        assert_eq!(repair_markup("span>a bird <sp"), "a bird");
        assert_eq!(repair_markup("<b>bird</b>"), "<b>bird</b>");

        let config = HighlightConfig::new();
        let mut rng = StdRng::seed_from_u64(5);
        let fragments = truncate_fulltext_with_rng(
            &config,
            &terms(&["bird"]),
            "line one<br>a bird<br/>line two",
            200,
            false,
            false,
            &mut rng,
        );
        assert_eq!(fragments, vec![format!("line one a {HIGHLIGHT_START}bird{HIGHLIGHT_END} line two")]);
    }

    #[test]
    fn test_match_offsets_in_multibyte_text() {
        let text = "Über den Fluß flog ein Vogel über München";
        let hits = find_hits(text, &["fluß".to_string(), "münchen".to_string()]);
        let chars: Vec<char> = text.chars().collect();
        let matched: Vec<String> = hits.iter().map(|r| chars[r.clone()].iter().collect()).collect();
        assert_eq!(matched, vec!["Fluß".to_string(), "München".to_string()]);

        assert_eq!(chars_before("aéb", &[0, 1, 3, 4]), vec![0, 1, 2, 3]);
        assert!(chars_before("abc", &[]).is_empty());
    }

    #[test]
    fn test_empty_text() {
        let config = HighlightConfig::new();
        assert!(truncate_fulltext(&config, &terms(&["bird"]), "  ", 100, false, true).is_empty());
    }
}
