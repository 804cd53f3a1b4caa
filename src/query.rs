//! Query construction.
//!
//! Everything in this module is a pure function of its input and the
//! [`SearchConfig`](crate::config::SearchConfig); nothing talks to the index
//! service.

pub mod access;
pub mod builder;
pub mod escape;
pub mod fields;
pub mod sort;
pub mod terms;

pub use self::access::{AccessIdentity, Anonymous, LicenseHolder, Superuser};
pub use self::builder::{AGGREGATION_QUERY_PREFIX, QueryBuilder, validate_query};
pub use self::fields::{boolify, defacetify, facetify, sortify};
pub use self::sort::SortField;
pub use self::terms::{SearchTerms, extract_search_terms};
