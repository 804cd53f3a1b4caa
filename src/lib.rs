//! # Vellum
//!
//! Search query construction, facet state and hit aggregation for digitized
//! document collections backed by an inverted-index search service.
//!
//! ## Features
//!
//! - Final query assembly with access-rights, blacklist and static filters
//! - Regular, hierarchical, range, geo and boolean facets with a URL-safe
//!   facet string
//! - Hit trees of records with their pages, metadata and user content
//! - Fuzzy, diacritic-insensitive highlighting and full-text fragments
//! - Saved searches, new-hit notifications, export tables and term browsing

pub mod browse;
pub mod cli;
pub mod config;
pub mod error;
pub mod facet;
pub mod fuzzy;
pub mod highlight;
pub mod hit;
pub mod index;
pub mod query;
pub mod search;
pub mod util;

pub mod prelude {
    pub use crate::config::{FacetFieldConfig, FacetKind, SearchConfig};
    pub use crate::error::{Result, VellumError};
    pub use crate::facet::{FacetItem, FacetState};
    pub use crate::hit::{HitAggregator, HitType, SearchHit};
    pub use crate::index::{IndexDocument, IndexRequest, IndexResponse, IndexService};
    pub use crate::query::{AccessIdentity, QueryBuilder};
    pub use crate::search::{SearchExecution, SearchOrchestrator, SearchRequest};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
