//! Display projection of an index document.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::highlight::{HighlightConfig, apply_highlighting_to_phrase};
use crate::index::document::{DocType, IndexDocument};
use crate::index::fields;

/// Placeholder for missing URL path segments.
const NO_VALUE: &str = "-";

/// One level of the structure hierarchy above a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructElementStub {
    pub iddoc: Option<String>,
    pub pi: Option<String>,
    pub label: String,
    pub docstrct_type: Option<String>,
    pub logid: Option<String>,
}

impl StructElementStub {
    pub fn from_document(doc: &IndexDocument, locale: &str) -> Self {
        StructElementStub {
            iddoc: doc.iddoc().map(str::to_string),
            pi: doc.pi_topstruct().map(str::to_string),
            label: document_label(doc, locale),
            docstrct_type: doc.first(fields::DOCSTRCT).map(str::to_string),
            logid: doc.first(fields::LOGID).map(str::to_string),
        }
    }
}

/// The label of a document in a locale.
///
/// Prefers a localized title (`MD_TITLE_LANG_DE`), then `LABEL`, `MD_TITLE`
/// and finally the structure type or page number.
pub fn document_label(doc: &IndexDocument, locale: &str) -> String {
    let localized = format!("{}_LANG_{}", fields::TITLE, locale.to_uppercase());
    [localized.as_str(), fields::LABEL, fields::TITLE]
        .iter()
        .find_map(|field| doc.first(field))
        .map(str::to_string)
        .or_else(|| match doc.doc_type() {
            Some(DocType::Page) => doc.first(fields::ORDER).map(|order| format!("{order}")),
            _ => doc.first(fields::DOCSTRCT).map(str::to_string),
        })
        .unwrap_or_default()
}

/// A read-only, display-ready view of one hit document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseElement {
    pub iddoc: Option<String>,
    pub pi: Option<String>,
    pub label: String,
    /// Label with search terms highlighted.
    pub label_highlighted: String,
    pub docstrct_type: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Structure hierarchy from the record down to this element.
    pub structure_elements: Vec<StructElementStub>,
    pub url: String,
    pub order: Option<i64>,
    /// Highlighted full-text snippet for page hits.
    pub fulltext: Option<String>,
    /// Template fields with their values.
    pub metadata: Vec<(String, Vec<String>)>,
}

impl BrowseElement {
    /// Build the projection of `doc`.
    ///
    /// `hierarchy` lists the documents above `doc`, root first. No thumbnail
    /// is produced when `access_denied` is set.
    pub fn new(
        doc: &IndexDocument,
        hierarchy: &[&IndexDocument],
        locale: &str,
        terms: &[String],
        config: &SearchConfig,
        highlight: &HighlightConfig,
        access_denied: bool,
    ) -> Self {
        let pi = doc.pi_topstruct().map(str::to_string);
        let label = document_label(doc, locale);
        let label_highlighted = highlight.replace_markers(&apply_highlighting_to_phrase(&label, terms));
        let order = doc
            .first_i64(fields::ORDER)
            .or_else(|| doc.first_i64(fields::THUMBPAGENO));

        let thumbnail_url = if access_denied {
            None
        } else {
            thumbnail_url(doc, config)
        };

        let mut structure_elements: Vec<StructElementStub> = hierarchy
            .iter()
            .map(|ancestor| StructElementStub::from_document(ancestor, locale))
            .collect();
        if doc.doc_type() == Some(DocType::Docstrct) {
            structure_elements.push(StructElementStub::from_document(doc, locale));
        }

        let docstrct_type = doc.first(fields::DOCSTRCT).map(str::to_string);
        let metadata = config
            .metadata_template(docstrct_type.as_deref().unwrap_or_default())
            .iter()
            .filter(|field| doc.has_field(field))
            .map(|field| {
                let values = doc
                    .values(field)
                    .iter()
                    .map(|v| highlight.replace_markers(&apply_highlighting_to_phrase(v, terms)))
                    .collect();
                (field.clone(), values)
            })
            .collect();

        let url = format!(
            "/object/{}/{}/{}/",
            pi.as_deref().unwrap_or(NO_VALUE),
            order.unwrap_or(1),
            doc.first(fields::LOGID).unwrap_or(NO_VALUE)
        );

        BrowseElement {
            iddoc: doc.iddoc().map(str::to_string),
            pi,
            label,
            label_highlighted,
            docstrct_type,
            thumbnail_url,
            structure_elements,
            url,
            order,
            fulltext: None,
            metadata,
        }
    }

    /// Attach the full-text snippet. Only valid during hit assembly.
    pub(crate) fn set_fulltext(&mut self, fulltext: Option<String>) {
        self.fulltext = fulltext;
    }
}

fn thumbnail_url(doc: &IndexDocument, config: &SearchConfig) -> Option<String> {
    let file = doc
        .first(fields::THUMBNAIL)
        .or_else(|| doc.first(fields::FILENAME))?;
    let pi = doc.pi_topstruct()?;
    Some(
        config
            .thumbnail_url_template
            .replace("{pi}", pi)
            .replace("{file}", file),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IndexDocument {
        IndexDocument::builder()
            .field(fields::IDDOC, "1")
            .field(fields::PI, "PPN1")
            .doc_type(DocType::Docstrct)
            .field(fields::DOCSTRCT, "monograph")
            .field(fields::LABEL, "A book on birds")
            .field(fields::THUMBNAIL, "00000001.tif")
            .field(fields::THUMBPAGENO, "1")
            .field(fields::LOGID, "LOG_0000")
            .field("MD_AUTHOR", "Bird, Jane")
            .build()
    }

    #[test]
    fn test_document_label() {
        assert_eq!(document_label(&record(), "en"), "A book on birds");

        let localized = IndexDocument::builder()
            .field("MD_TITLE_LANG_DE", "Vögel")
            .field(fields::LABEL, "Birds")
            .build();
        assert_eq!(document_label(&localized, "de"), "Vögel");
        assert_eq!(document_label(&localized, "en"), "Birds");

        let page = IndexDocument::builder()
            .doc_type(DocType::Page)
            .field(fields::ORDER, "12")
            .build();
        assert_eq!(document_label(&page, "en"), "12");
    }

    #[test]
    fn test_browse_element() {
        let config = SearchConfig::builder()
            .metadata_template("monograph", vec!["MD_AUTHOR".to_string(), "MD_YEAR".to_string()])
            .build();
        let highlight = HighlightConfig::new().tag("em", None);
        let terms = vec!["bird".to_string()];

        let element = BrowseElement::new(&record(), &[], "en", &terms, &config, &highlight, false);
        assert_eq!(element.label_highlighted, "A book on <em>bird</em>s");
        assert_eq!(element.url, "/object/PPN1/1/LOG_0000/");
        assert_eq!(
            element.thumbnail_url.as_deref(),
            Some("/api/records/PPN1/files/images/00000001.tif/full/!200,200/0/default.jpg")
        );
        assert_eq!(element.structure_elements.len(), 1);
        assert_eq!(
            element.metadata,
            vec![("MD_AUTHOR".to_string(), vec!["<em>Bird</em>, Jane".to_string()])]
        );

        let denied = BrowseElement::new(&record(), &[], "en", &terms, &config, &highlight, true);
        assert!(denied.thumbnail_url.is_none());
    }

    #[test]
    fn test_page_hierarchy() {
        let config = SearchConfig::default();
        let highlight = HighlightConfig::new();
        let owner = record();
        let page = IndexDocument::builder()
            .field(fields::IDDOC, "2")
            .field(fields::PI_TOPSTRUCT, "PPN1")
            .doc_type(DocType::Page)
            .field(fields::ORDER, "5")
            .field(fields::FILENAME, "00000005.tif")
            .build();

        let element = BrowseElement::new(&page, &[&owner], "en", &[], &config, &highlight, false);
        assert_eq!(element.structure_elements.len(), 1);
        assert_eq!(element.structure_elements[0].label, "A book on birds");
        assert_eq!(element.order, Some(5));
        assert_eq!(element.url, "/object/PPN1/5/-/");
    }
}
