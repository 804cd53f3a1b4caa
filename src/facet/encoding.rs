//! URL-safe persistence of active facets.
//!
//! Active facets are stored as `field:value;;field2:value2`, `-` meaning no
//! facets. Slashes, backslashes and percent signs in values are replaced by
//! `U002F`, `U005C` and `U0025` before the whole string is percent-encoded,
//! so that the result survives URL path segments.

use std::borrow::Cow;

use tracing::warn;

use crate::config::SearchConfig;
use crate::facet::item::{FacetItem, FacetItemKind};

/// Separator between facets.
pub const FACET_SEPARATOR: &str = ";;";

/// Facet string denoting no active facets.
pub const EMPTY_FACET_STRING: &str = "-";

const RESERVED: &[(&str, &str)] = &[("%", "U0025"), ("/", "U002F"), ("\\", "U005C")];

/// Replace reserved characters by their escape sequences.
pub fn escape_value(value: &str) -> String {
    RESERVED
        .iter()
        .fold(value.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Restore reserved characters.
pub fn unescape_value(value: &str) -> String {
    RESERVED
        .iter()
        .rev()
        .fold(value.to_string(), |acc, (from, to)| acc.replace(to, from))
}

/// Serialize facets into a facet string.
pub fn encode_facet_string(items: &[FacetItem]) -> String {
    if items.is_empty() {
        return EMPTY_FACET_STRING.to_string();
    }

    let joined = items
        .iter()
        .map(|item| match (&item.kind, &item.value2) {
            (FacetItemKind::Range, Some(to)) => format!(
                "{}:{};{}",
                item.field,
                escape_value(&item.value),
                escape_value(to)
            ),
            _ => format!("{}:{}", item.field, escape_value(&item.value)),
        })
        .collect::<Vec<_>>()
        .join(FACET_SEPARATOR);

    urlencoding::encode(&joined).into_owned()
}

/// Parse a facet string. Entries without a field are logged and dropped.
pub fn decode_facet_string(facet_string: &str, config: &SearchConfig) -> Vec<FacetItem> {
    let facet_string = facet_string.trim();
    if facet_string.is_empty() || facet_string == EMPTY_FACET_STRING {
        return Vec::new();
    }

    let decoded: Cow<'_, str> = match urlencoding::decode(facet_string) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(facet_string, error = %err, "facet string is not valid percent-encoding");
            Cow::Borrowed(facet_string)
        }
    };

    decoded
        .split(FACET_SEPARATOR)
        .filter(|link| !link.trim().is_empty())
        .filter_map(|link| {
            let item = FacetItem::from_link(link, config);
            if item.is_none() {
                warn!(link, "skipping facet without field");
            }
            item
        })
        .map(|mut item| {
            item.value = unescape_value(&item.value);
            item.value2 = item.value2.as_deref().map(unescape_value);
            item
        })
        .collect()
}
