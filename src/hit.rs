//! Search hits: typed result entries with display projections, found
//! metadata and nested child hits.

pub mod aggregator;
pub mod browse_element;
pub mod found_metadata;
pub mod types;

pub use self::aggregator::{HitAggregator, SearchHit};
pub use self::browse_element::{BrowseElement, StructElementStub, document_label};
pub use self::found_metadata::{ConfigTranslator, Translator, populate_found_metadata};
pub use self::types::HitType;
