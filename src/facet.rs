//! Facets: active filters, available values and their persisted form.

pub mod encoding;
pub mod filter;
pub mod geo;
pub mod item;
pub mod state;

pub use self::encoding::{decode_facet_string, encode_facet_string};
pub use self::geo::{GeoPoint, GeoShape};
pub use self::item::{FacetItem, FacetItemKind, HierarchicalValue};
pub use self::state::{FacetState, RangeValues};
