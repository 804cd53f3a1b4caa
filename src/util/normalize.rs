//! Character folding shared by highlighting and fuzzy matching.
//!
//! [`fold_char`] maps every character to exactly one character. Highlighting
//! relies on that: match positions found in the folded copy of a phrase are
//! valid positions in the original phrase.

use unicode_normalization::UnicodeNormalization;

/// Hyphenation marks that OCR output leaves inside words.
const HYPHENATION_MARKS: &[char] = &['\u{00AD}', '¬', '⸗', '\u{2010}', '-'];

/// Fold a single character: strip diacritics, map historic character variants
/// to their modern form and lowercase.
pub fn fold_char(c: char) -> char {
    let base = match c {
        'ſ' => 's',
        'ß' => 's',
        'ı' => 'i',
        'ł' | 'Ł' => 'l',
        'đ' | 'Đ' => 'd',
        'ø' | 'Ø' => 'o',
        'æ' | 'Æ' => 'a',
        'œ' | 'Œ' => 'o',
        _ if c.is_ascii() => c,
        _ => c.to_string().nfd().next().unwrap_or(c),
    };
    base.to_lowercase().next().unwrap_or(base)
}

/// Fold a string for matching, one output character per input character.
///
/// Anything that is not a letter or digit becomes a space, so punctuation
/// never takes part in a match.
pub fn fold_for_matching(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| {
            let folded = fold_char(c);
            if folded.is_alphanumeric() { folded } else { ' ' }
        })
        .collect()
}

/// Strip diacritics and lowercase, dropping combining marks.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Clean a word for fuzzy comparison: remove hyphenation marks, fold
/// characters and trim everything around the word itself.
pub fn clean_word(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|c| !HYPHENATION_MARKS.contains(c))
        .map(fold_char)
        .collect();
    folded
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}
