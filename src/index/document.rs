//! Flat documents as returned by the index service.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::index::fields;

/// Document type declared in a document's `DOCTYPE` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    /// A structure element (record, chapter, article...).
    Docstrct,
    /// A page with images and full text.
    Page,
    /// A grouped metadata entry (person, corporation...).
    Metadata,
    /// User-generated content attached to a page.
    Ugc,
    /// An event record (e.g. provenance).
    Event,
    /// A group (series) record.
    Group,
}

impl DocType {
    /// Parse the index value of a `DOCTYPE` field.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "DOCSTRCT" => Some(DocType::Docstrct),
            "PAGE" => Some(DocType::Page),
            "METADATA" => Some(DocType::Metadata),
            "UGC" => Some(DocType::Ugc),
            "EVENT" => Some(DocType::Event),
            "GROUP" => Some(DocType::Group),
            _ => None,
        }
    }

    /// The index value of this document type.
    pub fn name(&self) -> &'static str {
        match self {
            DocType::Docstrct => "DOCSTRCT",
            DocType::Page => "PAGE",
            DocType::Metadata => "METADATA",
            DocType::Ugc => "UGC",
            DocType::Event => "EVENT",
            DocType::Group => "GROUP",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single index document: an ordered map of multi-valued string fields.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct IndexDocument {
    fields: IndexMap<String, Vec<String>>,
}

impl IndexDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        IndexDocument {
            fields: IndexMap::new(),
        }
    }

    /// Append a value to a field.
    pub fn add_value<S: Into<String>, T: Into<String>>(&mut self, name: S, value: T) {
        self.fields
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// First value of a field.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a field, empty if the field is absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of a field parsed as an integer.
    pub fn first_i64(&self, name: &str) -> Option<i64> {
        self.first(name).and_then(|v| v.trim().parse().ok())
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in index order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All fields.
    pub fn fields(&self) -> &IndexMap<String, Vec<String>> {
        &self.fields
    }

    /// The document's unique identifier (`IDDOC`).
    pub fn iddoc(&self) -> Option<&str> {
        self.first(fields::IDDOC)
    }

    /// The persistent identifier of the record this document belongs to.
    pub fn pi_topstruct(&self) -> Option<&str> {
        self.first(fields::PI_TOPSTRUCT)
            .or_else(|| self.first(fields::PI))
    }

    /// The document type, if declared and known.
    pub fn doc_type(&self) -> Option<DocType> {
        self.first(fields::DOCTYPE).and_then(DocType::from_name)
    }

    /// Whether this is a top-level record or an anchor record.
    pub fn is_top_level(&self) -> bool {
        self.first(fields::ISWORK) == Some("true") || self.first(fields::ISANCHOR) == Some("true")
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> IndexDocumentBuilder {
        IndexDocumentBuilder::new()
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct IndexDocumentBuilder {
    document: IndexDocument,
}

impl IndexDocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        IndexDocumentBuilder {
            document: IndexDocument::new(),
        }
    }

    /// Add a value to a field.
    pub fn field<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_value(name, value);
        self
    }

    /// Add several values to a field.
    pub fn field_values<S, I, T>(mut self, name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let name = name.into();
        for value in values {
            self.document.add_value(name.clone(), value);
        }
        self
    }

    /// Set the document type.
    pub fn doc_type(self, doc_type: DocType) -> Self {
        self.field(fields::DOCTYPE, doc_type.name())
    }

    /// Build the final document.
    pub fn build(self) -> IndexDocument {
        self.document
    }
}
