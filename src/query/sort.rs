//! Sort specifications.
//!
//! A sort string lists fields separated by `;`. A leading `!` sorts that field
//! in descending order and the keyword `RANDOM` shuffles the results.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VellumError};
use crate::query::fields::sortify;

/// Keyword requesting a random order.
pub const RANDOM: &str = "RANDOM";

const DESCENDING_MARKER: char = '!';

/// One field of a sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    /// Ascending sort on a field.
    pub fn asc<S: Into<String>>(field: S) -> Self {
        SortField {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending sort on a field.
    pub fn desc<S: Into<String>>(field: S) -> Self {
        SortField {
            field: field.into(),
            descending: true,
        }
    }

    /// A random sort field with a fresh seed.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        SortField::asc(format!("random_{}", rng.random_range(0..i32::MAX)))
    }

    /// Parse one entry of a sort string.
    ///
    /// Returns `None` for blank entries.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        let (field, descending) = match entry.strip_prefix(DESCENDING_MARKER) {
            Some(field) => (field.trim(), true),
            None => (entry, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(SortField {
            field: sortify(field),
            descending,
        })
    }

    /// Whether this is a random sort field.
    pub fn is_random(&self) -> bool {
        self.field.starts_with("random_")
    }

    /// The sort in `field asc|desc` form.
    pub fn to_param(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{} {}", self.field, direction)
    }

    /// The sort in sort-string form (`!field` for descending).
    pub fn to_sort_string(&self) -> String {
        if self.descending {
            format!("{DESCENDING_MARKER}{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Parse a user sort string such as `SORT_TITLE;!YEAR`.
pub fn parse_sort_string<R: Rng>(sort_string: &str, rng: &mut R) -> Vec<SortField> {
    sort_string
        .split(';')
        .filter_map(|entry| {
            if entry.trim() == RANDOM {
                Some(SortField::random(rng))
            } else {
                SortField::parse(entry)
            }
        })
        .collect()
}

/// Serialize sort fields back into a sort string.
pub fn to_sort_string(sort_fields: &[SortField]) -> String {
    sort_fields
        .iter()
        .map(SortField::to_sort_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Combine configured static sort fields with the user's sort string.
///
/// Static fields come first. User fields already covered by a static field are
/// dropped. A blank static field is a configuration error.
pub fn build_sort_fields<R: Rng>(
    static_fields: &[String],
    user_sort: &str,
    rng: &mut R,
) -> Result<Vec<SortField>> {
    let mut sort_fields = Vec::with_capacity(static_fields.len() + 2);
    for entry in static_fields {
        let field = SortField::parse(entry)
            .ok_or_else(|| VellumError::configuration("blank static sort field"))?;
        sort_fields.push(field);
    }

    for field in parse_sort_string(user_sort, rng) {
        if !sort_fields.iter().any(|f| f.field == field.field) {
            sort_fields.push(field);
        }
    }

    Ok(sort_fields)
}
