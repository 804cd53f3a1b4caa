//! Edit distance routines used by fuzzy term matching.
//!
//! All functions work on Unicode scalar values, not bytes, so that
//! `"über"` and `"uber"` are one edit apart.

use std::cmp::min;

/// Calculate the Damerau-Levenshtein distance between two strings.
///
/// Counts insertions, deletions, substitutions and transpositions of two
/// adjacent characters (optimal string alignment variant).
pub fn damerau_levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    damerau_levenshtein_chars(&s1_chars, &s2_chars)
}

/// Damerau-Levenshtein distance over pre-split character slices.
///
/// Used by the sliding-window matcher, which compares many sub-slices of the
/// same text against one term without re-collecting characters.
#[allow(clippy::needless_range_loop)]
pub fn damerau_levenshtein_chars(s1: &[char], s2: &[char]) -> usize {
    let len1 = s1.len();
    let len2 = s2.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];

    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = usize::from(s1[i - 1] != s2[j - 1]);

            matrix[i][j] = min(
                min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );

            if i > 1 && j > 1 && s1[i - 1] == s2[j - 2] && s1[i - 2] == s2[j - 1] {
                matrix[i][j] = min(matrix[i][j], matrix[i - 2][j - 2] + 1); // transposition
            }
        }
    }

    matrix[len1][len2]
}

/// Check whether two character slices are within `max_distance` edits.
///
/// Returns early without building the matrix when the length difference alone
/// already exceeds the allowed distance.
pub fn within_distance(s1: &[char], s2: &[char], max_distance: usize) -> bool {
    if s1.len().abs_diff(s2.len()) > max_distance {
        return false;
    }
    damerau_levenshtein_chars(s1, s2) <= max_distance
}
