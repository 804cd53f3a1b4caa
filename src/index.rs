//! Contract with the external inverted-index search service.
//!
//! The core never talks to a concrete backend. It builds [`IndexRequest`]s,
//! hands them to an [`IndexService`] implementation and reads back flat
//! [`IndexDocument`]s plus facet histograms.

pub mod document;
pub mod fields;
pub mod service;

pub use self::document::{DocType, IndexDocument, IndexDocumentBuilder};
pub use self::service::{
    ExpandParams, FacetHistogram, FulltextLoader, IndexRequest, IndexResponse, IndexService,
    StoredFulltext,
};
