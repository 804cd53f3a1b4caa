//! Field name transforms between metadata, facet, sort and boolean fields.
//!
//! Index fields carry their role in a prefix: `MD_TITLE` is the searchable
//! metadata field, `FACET_TITLE` its untokenized facet twin, `SORT_TITLE` the
//! sort twin and `BOOL_TITLE` marks whether a record has the field at all.
//! Structural and calendar fields are shared across roles and keep their
//! names.

use crate::index::fields;

/// Metadata prefix to facet prefix. Longer prefixes come first.
const FACET_PREFIXES: &[(&str, &str)] = &[
    ("MDNUM_", "FACETNUM_"),
    ("MD2_", "FACET2_"),
    ("MD_", "FACET_"),
    ("NE_", "FACETNE_"),
];

const SORT_PREFIXES: &[(&str, &str)] = &[
    ("MDNUM_", "SORTNUM_"),
    ("MD2_", "SORT_"),
    ("MD_", "SORT_"),
    ("NE_", "SORT_"),
];

const BOOL_PREFIX: &str = "BOOL_";

/// Fields shared by all roles.
fn is_transform_exception(field: &str) -> bool {
    field == fields::DC
        || field.starts_with(fields::DOCSTRCT)
        || field.starts_with(BOOL_PREFIX)
        || fields::is_calendar_field(field)
}

/// Map a metadata field to its facet field (`MD_X` to `FACET_X`).
pub fn facetify(field: &str) -> String {
    if is_transform_exception(field) {
        return field.to_string();
    }
    for (from, to) in FACET_PREFIXES {
        if let Some(rest) = field.strip_prefix(from) {
            return format!("{to}{rest}");
        }
    }
    field.to_string()
}

/// Map a facet field back to its metadata field (`FACET_X` to `MD_X`).
pub fn defacetify(field: &str) -> String {
    if is_transform_exception(field) {
        return field.to_string();
    }
    for (to, from) in FACET_PREFIXES {
        if let Some(rest) = field.strip_prefix(from) {
            return format!("{to}{rest}");
        }
    }
    field.to_string()
}

/// Map a metadata field to its sort field (`MD_X` to `SORT_X`).
pub fn sortify(field: &str) -> String {
    if field.starts_with("SORT") || fields::is_calendar_field(field) {
        return field.to_string();
    }
    if field == fields::DC || field.starts_with(fields::DOCSTRCT) {
        return format!("SORT_{field}");
    }
    for (from, to) in SORT_PREFIXES {
        if let Some(rest) = field.strip_prefix(from) {
            return format!("{to}{rest}");
        }
    }
    field.to_string()
}

/// Map a metadata field to its existence flag (`MD_X` to `BOOL_X`).
pub fn boolify(field: &str) -> String {
    if field.starts_with(BOOL_PREFIX) {
        return field.to_string();
    }
    let bare = ["MD_", "MD2_", "NE_"]
        .iter()
        .find_map(|prefix| field.strip_prefix(prefix))
        .unwrap_or(field);
    format!("{BOOL_PREFIX}{bare}")
}
