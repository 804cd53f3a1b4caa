//! "Found in" explanations: document fields that matched a search term but
//! are not part of the hit's display label.

use std::collections::HashMap;

use crate::config::SearchConfig;
use crate::highlight::{HIGHLIGHT_START, HighlightConfig, apply_highlighting_to_phrase, strip_markers};
use crate::index::document::IndexDocument;
use crate::index::fields;
use crate::query::terms::SearchTerms;

/// Translates field names into display labels.
pub trait Translator: Send + Sync {
    /// The label of `key` in `locale`; the key itself if unknown.
    fn translate(&self, key: &str, locale: &str) -> String;
}

/// Translator backed by the configured field labels.
#[derive(Debug, Clone, Default)]
pub struct ConfigTranslator {
    labels: HashMap<String, HashMap<String, String>>,
}

impl ConfigTranslator {
    pub fn new(labels: HashMap<String, HashMap<String, String>>) -> Self {
        ConfigTranslator { labels }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.field_labels.clone())
    }
}

impl Translator for ConfigTranslator {
    fn translate(&self, key: &str, locale: &str) -> String {
        self.labels
            .get(locale)
            .and_then(|labels| labels.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Fields searched by catch-all terms.
fn is_metadata_field(field: &str) -> bool {
    (field.starts_with("MD_") || field.starts_with("MD2_") || field.starts_with("NE_"))
        && !field.ends_with(fields::SUFFIX_UNTOKENIZED)
}

fn is_catch_all(field: &str) -> bool {
    matches!(
        field,
        fields::DEFAULT | fields::FULLTEXT | fields::UGCTERMS
    )
}

/// Everything needed to explain the matches of one hit.
pub struct FoundMetadataContext<'a> {
    pub config: &'a SearchConfig,
    pub highlight: &'a HighlightConfig,
    pub translator: &'a dyn Translator,
    pub locale: &'a str,
}

/// Collect `(label, highlighted value)` pairs for document values containing
/// a search term.
///
/// Values equal to the hit label and values already reported by the owner
/// hit are skipped, as are ignored fields.
pub fn populate_found_metadata(
    ctx: &FoundMetadataContext<'_>,
    doc: &IndexDocument,
    terms: &SearchTerms,
    hit_label: &str,
    owner_found: &[(String, String)],
) -> Vec<(String, String)> {
    let mut found: Vec<(String, String)> = Vec::new();
    let hit_label = hit_label.trim().to_lowercase();

    for term_field in terms.fields() {
        let candidate_fields: Vec<&str> = if is_catch_all(term_field) {
            doc.field_names().filter(|f| is_metadata_field(f)).collect()
        } else {
            doc.field_names().filter(|f| *f == term_field).collect()
        };
        let field_terms = terms.get(term_field);

        for field in candidate_fields {
            if ctx
                .config
                .ignored_found_metadata_fields
                .iter()
                .any(|ignored| ignored == field)
            {
                continue;
            }

            for value in doc.values(field) {
                let highlighted = apply_highlighting_to_phrase(value, field_terms);
                if !highlighted.contains(HIGHLIGHT_START) {
                    continue;
                }
                if strip_markers(&highlighted).trim().to_lowercase() == hit_label {
                    continue;
                }
                let label = ctx.translator.translate(field, ctx.locale);
                let value = ctx.highlight.replace_markers(&highlighted);
                let reported = |(l, v): &(String, String)| *l == label && *v == value;
                if owner_found.iter().any(reported) || found.iter().any(reported) {
                    continue;
                }
                found.push((label, value));
            }
        }
    }

    found
}
