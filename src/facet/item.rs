//! Facet items and hierarchical facet values.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;

/// Kind of a facet item; decides how it becomes a filter query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacetItemKind {
    #[default]
    Simple,
    Range,
    Geo,
    Boolean,
}

/// One facet value, either active (a filter) or available (with a count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetItem {
    pub field: String,
    pub value: String,
    /// Upper bound of a range facet.
    pub value2: Option<String>,
    pub count: u64,
    pub hierarchical: bool,
    pub kind: FacetItemKind,
}

impl FacetItem {
    /// Create a simple facet item.
    pub fn new<S: Into<String>, T: Into<String>>(field: S, value: T) -> Self {
        FacetItem {
            field: field.into(),
            value: value.into(),
            value2: None,
            count: 0,
            hierarchical: false,
            kind: FacetItemKind::Simple,
        }
    }

    /// Create a range facet item.
    pub fn range<S, T, U>(field: S, from: T, to: U) -> Self
    where
        S: Into<String>,
        T: Into<String>,
        U: Into<String>,
    {
        FacetItem {
            value2: Some(to.into()),
            kind: FacetItemKind::Range,
            ..FacetItem::new(field, from)
        }
    }

    /// Create a geo facet item from a coordinate list.
    pub fn geo<S: Into<String>, T: Into<String>>(field: S, shape: T) -> Self {
        FacetItem {
            kind: FacetItemKind::Geo,
            ..FacetItem::new(field, shape)
        }
    }

    /// Mark the item as hierarchical.
    pub fn hierarchical(mut self, hierarchical: bool) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    /// Set the hit count.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Parse a `field:value` link, resolving kind and hierarchy from the
    /// configuration.
    ///
    /// Range fields accept `field:from;to` and the bracket form
    /// `field:[from TO to]`. Returns `None` for links without a field.
    pub fn from_link(link: &str, config: &SearchConfig) -> Option<Self> {
        let (field, value) = link.split_once(':')?;
        let field = field.trim();
        if field.is_empty() {
            return None;
        }

        if let Some((from, to)) = parse_bracket_range(value) {
            return Some(FacetItem::range(field, from, to));
        }
        if config.is_range_field(field) {
            let (from, to) = value.split_once(';').unwrap_or((value, value));
            return Some(FacetItem::range(field, from.trim(), to.trim()));
        }
        if config.is_geo_field(field) {
            return Some(FacetItem::geo(field, value));
        }

        let mut item =
            FacetItem::new(field, value).hierarchical(config.is_hierarchical_field(field));
        if config.is_boolean_field(field) {
            item.kind = FacetItemKind::Boolean;
        }
        Some(item)
    }

    /// The `field:value` (or `field:from;to`) form of this item.
    pub fn link(&self) -> String {
        match (&self.kind, &self.value2) {
            (FacetItemKind::Range, Some(to)) => format!("{}:{};{}", self.field, self.value, to),
            _ => format!("{}:{}", self.field, self.value),
        }
    }

    /// Whether this item and `other` select the same field value.
    pub fn same_value(&self, other: &FacetItem) -> bool {
        self.field == other.field && self.value == other.value && self.value2 == other.value2
    }
}

fn parse_bracket_range(value: &str) -> Option<(&str, &str)> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (from, to) = inner.split_once(" TO ")?;
    Some((from.trim(), to.trim()))
}

/// A dotted hierarchical value such as `science.biology.botany`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchicalValue {
    /// Path components from the root.
    pub path: Vec<String>,
}

impl HierarchicalValue {
    /// Split a value on the hierarchy separator.
    pub fn from_delimited(value: &str, separator: &str) -> Self {
        let path = value.split(separator).map(|s| s.to_string()).collect();
        HierarchicalValue { path }
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Check if this value is an ancestor of another.
    pub fn is_ancestor_of(&self, other: &HierarchicalValue) -> bool {
        if self.depth() >= other.depth() {
            return false;
        }

        self.path.iter().zip(other.path.iter()).all(|(a, b)| a == b)
    }

    /// The value one level up.
    pub fn parent(&self) -> Option<HierarchicalValue> {
        if self.path.len() > 1 {
            let mut parent_path = self.path.clone();
            parent_path.pop();
            Some(HierarchicalValue { path: parent_path })
        } else {
            None
        }
    }

    /// All values from the root down to this one (`a`, `a.b`, `a.b.c`).
    pub fn ancestors_and_self(&self, separator: &str) -> Vec<String> {
        (1..=self.path.len())
            .map(|depth| self.path[..depth].join(separator))
            .collect()
    }

    pub fn to_string_with_delimiter(&self, separator: &str) -> String {
        self.path.join(separator)
    }
}
