//! Request/response types and collaborator traits for the index service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::document::IndexDocument;
use crate::index::fields;
use crate::query::sort::SortField;

/// Parameters for returning child documents alongside each top-level hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandParams {
    /// Query the child documents must match.
    pub query: String,
    /// Additional filters on the child documents.
    pub filter_queries: Vec<String>,
    /// Field that links children to their parent hit.
    pub field: String,
    /// Maximum number of children returned per parent.
    pub rows: usize,
}

/// A structured query for the index service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    /// The main query string.
    pub query: String,
    /// Filter queries; they restrict the result set without affecting scoring.
    pub filter_queries: Vec<String>,
    /// Fields to compute value histograms for.
    pub facet_fields: Vec<String>,
    /// Sort order, applied in sequence.
    pub sort_fields: Vec<SortField>,
    /// Offset of the first document to return.
    pub start: usize,
    /// Number of documents to return.
    pub rows: usize,
    /// Stored fields to return; empty means all.
    pub result_fields: Vec<String>,
    /// Collapse hits sharing the same value of this field.
    pub collapse_field: Option<String>,
    /// Child document expansion.
    pub expand: Option<ExpandParams>,
    /// Minimum count of a histogram value to be returned.
    pub facet_min_count: u64,
}

impl IndexRequest {
    /// Create a request for the given query returning no documents.
    pub fn new<S: Into<String>>(query: S) -> Self {
        IndexRequest {
            query: query.into(),
            filter_queries: Vec::new(),
            facet_fields: Vec::new(),
            sort_fields: Vec::new(),
            start: 0,
            rows: 0,
            result_fields: Vec::new(),
            collapse_field: None,
            expand: None,
            facet_min_count: 1,
        }
    }

    /// Set the filter queries.
    pub fn filter_queries(mut self, filter_queries: Vec<String>) -> Self {
        self.filter_queries = filter_queries;
        self
    }

    /// Set the facet fields.
    pub fn facet_fields(mut self, facet_fields: Vec<String>) -> Self {
        self.facet_fields = facet_fields;
        self
    }

    /// Set the sort fields.
    pub fn sort_fields(mut self, sort_fields: Vec<SortField>) -> Self {
        self.sort_fields = sort_fields;
        self
    }

    /// Set the page window.
    pub fn page(mut self, start: usize, rows: usize) -> Self {
        self.start = start;
        self.rows = rows;
        self
    }

    /// Collapse hits on a group identity field.
    pub fn collapse_on<S: Into<String>>(mut self, field: S) -> Self {
        self.collapse_field = Some(field.into());
        self
    }

    /// Request child documents for each hit.
    pub fn expand(mut self, expand: ExpandParams) -> Self {
        self.expand = Some(expand);
        self
    }

    /// Whether this request only asks for counts and histograms.
    pub fn is_probe(&self) -> bool {
        self.rows == 0
    }
}

/// Value counts of one facet field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetHistogram {
    /// Field name; backends occasionally return unnamed entries.
    pub name: Option<String>,
    /// Values with their hit counts, in backend order.
    pub counts: Vec<(String, u64)>,
}

impl FacetHistogram {
    /// Create a histogram for a named field.
    pub fn new<S: Into<String>>(name: S, counts: Vec<(String, u64)>) -> Self {
        FacetHistogram {
            name: Some(name.into()),
            counts,
        }
    }
}

/// The index service's answer to an [`IndexRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Total number of matching documents (or groups, when collapsed).
    pub num_found: u64,
    /// The requested page of documents.
    pub documents: Vec<IndexDocument>,
    /// One histogram per requested facet field.
    pub facet_fields: Vec<FacetHistogram>,
    /// Child documents keyed by the parent's expand field value.
    pub expanded: HashMap<String, Vec<IndexDocument>>,
}

/// A blocking client for the inverted-index search service.
///
/// Transport-level timeouts are the implementation's concern. An unreachable
/// service is reported as [`crate::error::VellumError::TransientBackend`].
pub trait IndexService: Send + Sync {
    /// Execute a structured query.
    fn search(&self, request: &IndexRequest) -> Result<IndexResponse>;

    /// Fetch a single document by its `IDDOC`.
    fn document_by_iddoc(&self, iddoc: &str) -> Result<Option<IndexDocument>>;
}

/// Loads the full text of a page document.
///
/// Returns `Ok(None)` when the page has no text and
/// [`crate::error::VellumError::AccessDenied`] when the current user may not
/// read it.
pub trait FulltextLoader: Send + Sync {
    /// Load the full text for a page document.
    fn load_fulltext(&self, page: &IndexDocument) -> Result<Option<String>>;
}

/// Reads the full text stored in the page document's `FULLTEXT` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredFulltext;

impl FulltextLoader for StoredFulltext {
    fn load_fulltext(&self, page: &IndexDocument) -> Result<Option<String>> {
        Ok(page
            .first(fields::FULLTEXT)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string))
    }
}
