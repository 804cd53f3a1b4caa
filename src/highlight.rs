//! Search term highlighting in metadata values and full-text fragments.
//!
//! Highlighting runs in two phases. Matches are first wrapped in sentinel
//! tokens that no regular text contains, then the sentinels are replaced by
//! the configured markup. Matching of later terms never sees markup.

pub mod fragment;
pub mod phrase;

use std::collections::HashSet;

use crate::config::SearchConfig;

pub use self::fragment::{truncate_fulltext, truncate_fulltext_with_rng};
pub use self::phrase::apply_highlighting_to_phrase;

/// Sentinel inserted before a highlighted span.
pub const HIGHLIGHT_START: &str = "##HLS##";
/// Sentinel inserted after a highlighted span.
pub const HIGHLIGHT_END: &str = "##HLE##";

/// Configuration for text highlighting.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Markup replacing [`HIGHLIGHT_START`].
    pub start_markup: String,
    /// Markup replacing [`HIGHLIGHT_END`].
    pub end_markup: String,
    /// Length of each fragment in characters.
    pub fragment_length: usize,
    /// Lowercased terms that are never highlighted.
    pub stopwords: HashSet<String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            start_markup: "<span class=\"search-list--highlight\">".to_string(),
            end_markup: "</span>".to_string(),
            fragment_length: 200,
            stopwords: HashSet::new(),
        }
    }
}

impl HighlightConfig {
    /// Create a new highlight configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take markup, fragment length and stopwords from the search configuration.
    pub fn from_search_config(config: &SearchConfig) -> Self {
        HighlightConfig {
            start_markup: config.highlight_start.clone(),
            end_markup: config.highlight_end.clone(),
            fragment_length: config.fragment_length,
            stopwords: config
                .stopwords
                .iter()
                .map(|s| s.trim().to_lowercase())
                .collect(),
        }
    }

    /// Wrap highlights in an HTML tag, optionally with a CSS class.
    pub fn tag(mut self, tag: &str, css_class: Option<&str>) -> Self {
        self.start_markup = match css_class {
            Some(css_class) => format!("<{tag} class=\"{css_class}\">"),
            None => format!("<{tag}>"),
        };
        self.end_markup = format!("</{tag}>");
        self
    }

    /// Set the fragment length.
    pub fn fragment_length(mut self, fragment_length: usize) -> Self {
        self.fragment_length = fragment_length;
        self
    }

    /// Set the stopwords.
    pub fn stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = stopwords
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Whether a term is a stopword.
    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(&term.trim().to_lowercase())
    }

    /// Replace sentinels by the configured markup.
    pub fn replace_markers(&self, text: &str) -> String {
        text.replace(HIGHLIGHT_START, &self.start_markup)
            .replace(HIGHLIGHT_END, &self.end_markup)
    }
}

/// Remove sentinels without adding markup.
pub fn strip_markers(text: &str) -> String {
    text.replace(HIGHLIGHT_START, "").replace(HIGHLIGHT_END, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_markers() {
        let config = HighlightConfig::new().tag("mark", Some("hit"));
        assert_eq!(
            config.replace_markers("a ##HLS##bird##HLE## b"),
            "a <mark class=\"hit\">bird</mark> b"
        );
        assert_eq!(strip_markers("##HLS##bird##HLE##"), "bird");
    }

    #[test]
    fn test_from_search_config() {
        let search_config = SearchConfig::builder()
            .stopwords(vec!["The".to_string(), " and".to_string()])
            .fragment_length(120)
            .highlight_markup("<em>", "</em>")
            .build();
        let config = HighlightConfig::from_search_config(&search_config);
        assert!(config.is_stopword("the"));
        assert!(config.is_stopword("AND"));
        assert_eq!(config.fragment_length, 120);
        assert_eq!(config.replace_markers("##HLS##x##HLE##"), "<em>x</em>");
    }
}
