//! Per-session facet state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{FacetKind, SearchConfig};
use crate::error::Result;
use crate::facet::encoding::{decode_facet_string, encode_facet_string};
use crate::facet::filter;
use crate::facet::item::{FacetItem, FacetItemKind, HierarchicalValue};
use crate::index::fields;
use crate::index::service::FacetHistogram;
use crate::query::fields::defacetify;

/// Value distribution of an integer facet field, used to render sliders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValues {
    /// Smallest value present in the window.
    pub min: i64,
    /// Largest value present in the window.
    pub max: i64,
    /// Hit count per value, sorted by value.
    pub value_counts: BTreeMap<i64, u64>,
}

#[derive(Debug, Default)]
struct FacetStateInner {
    active: Vec<FacetItem>,
    available: IndexMap<String, Vec<FacetItem>>,
    ranges: HashMap<String, RangeValues>,
}

impl FacetStateInner {
    fn has_active_range_facet(&self, config: &SearchConfig) -> bool {
        self.active
            .iter()
            .any(|item| item.kind == FacetItemKind::Range || config.is_range_field(&item.field))
    }
}

/// Active and available facets of one user session.
///
/// A session may be read by a rendering thread while a request thread
/// updates it, so every access goes through an internal mutex.
#[derive(Debug)]
pub struct FacetState {
    config: Arc<SearchConfig>,
    inner: Mutex<FacetStateInner>,
}

impl FacetState {
    /// Create an empty facet state.
    pub fn new(config: Arc<SearchConfig>) -> Self {
        FacetState {
            config,
            inner: Mutex::new(FacetStateInner::default()),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Replace all active facets with those parsed from a facet string.
    ///
    /// Slider ranges are reset only if no range facet remains active.
    pub fn set_active_facet_string(&self, facet_string: &str) {
        let items = decode_facet_string(facet_string, &self.config);
        let mut inner = self.inner.lock();
        inner.active = items;
        if !inner.has_active_range_facet(&self.config) {
            inner.ranges.clear();
        }
        debug!(active = inner.active.len(), "active facets replaced");
    }

    /// The active facets as a facet string.
    pub fn active_facet_string(&self) -> String {
        encode_facet_string(&self.inner.lock().active)
    }

    /// A snapshot of the active facets.
    pub fn active_facets(&self) -> Vec<FacetItem> {
        self.inner.lock().active.clone()
    }

    /// Set the single active value of a field, creating the facet if needed.
    ///
    /// Range values may be given as `from;to`.
    pub fn update_facet_item(&self, field: &str, value: &str, hierarchical: bool) {
        let Some(mut item) = FacetItem::from_link(&format!("{field}:{value}"), &self.config)
        else {
            return;
        };
        item.hierarchical = hierarchical;

        let mut inner = self.inner.lock();
        match inner.active.iter().position(|active| active.field == field) {
            Some(index) => inner.active[index] = item,
            None => inner.active.push(item),
        }
    }

    /// Remove an active facet. Returns whether anything was removed.
    pub fn remove_facet_item(&self, field: &str, value: &str) -> bool {
        let link = format!("{field}:{value}");
        let mut inner = self.inner.lock();
        let before = inner.active.len();
        inner
            .active
            .retain(|item| !(item.field == field && (item.value == value || item.link() == link)));
        let removed = inner.active.len() != before;
        if removed && !inner.has_active_range_facet(&self.config) {
            inner.ranges.clear();
        }
        removed
    }

    /// Remove every active facet of a field.
    pub fn remove_field(&self, field: &str) {
        self.inner.lock().active.retain(|item| item.field != field);
    }

    /// Whether a field value is currently active.
    pub fn is_facet_active(&self, field: &str, value: &str) -> bool {
        let link = format!("{field}:{value}");
        self.inner
            .lock()
            .active
            .iter()
            .any(|item| item.field == field && (item.value == value || item.link() == link))
    }

    /// Whether any value of a field is active.
    pub fn is_field_active(&self, field: &str) -> bool {
        self.inner.lock().active.iter().any(|item| item.field == field)
    }

    /// The active geo facet of a field, inserting one with the configured
    /// default shape if none exists.
    ///
    /// Returns `None` if the field is not configured as a geo field.
    pub fn get_geo_facet(&self, field: &str) -> Option<FacetItem> {
        let facet_config = self
            .config
            .facet_field(field)
            .filter(|f| f.kind == FacetKind::Geo)?;

        let mut inner = self.inner.lock();
        if let Some(item) = inner
            .active
            .iter()
            .find(|item| item.field == field && item.kind == FacetItemKind::Geo)
        {
            return Some(item.clone());
        }

        let item = FacetItem::geo(field, facet_config.geo_default.clone().unwrap_or_default());
        inner.active.push(item.clone());
        Some(item)
    }

    /// Filter queries for the active facets.
    pub fn generate_facet_filter_queries(&self, include_range: bool) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        filter::generate_facet_filter_queries(&self.config, &inner.active, include_range)
    }

    /// The combined hierarchical facet filter, if any hierarchical facet is
    /// active.
    pub fn generate_hierarchical_facet_filter_query(&self) -> Result<Option<String>> {
        let inner = self.inner.lock();
        filter::generate_hierarchical_facet_filter_query(&self.config, &inner.active)
    }

    /// The child-document filter for active sub-element facets.
    pub fn generate_sub_element_facet_filter_query(&self) -> String {
        let inner = self.inner.lock();
        filter::generate_sub_element_facet_filter_query(&self.config, &inner.active)
    }

    /// The root-to-leaf values of a hierarchical facet value, for breadcrumbs.
    pub fn hierarchy_of(&self, field: &str, value: &str) -> Result<Vec<String>> {
        let separator = self.config.splitting_char(field)?;
        Ok(HierarchicalValue::from_delimited(value, &separator).ancestors_and_self(&separator))
    }

    fn is_integer_field(&self, field: &str) -> bool {
        field == fields::CALENDAR_YEAR
            || field.starts_with("MDNUM_")
            || self.config.is_range_field(field)
    }

    /// Record the value distribution of an integer field.
    ///
    /// Values outside the configured window and values that are not integers
    /// are ignored. Returns `false` if the field is not integer-valued or no
    /// value remains.
    pub fn populate_absolute_min_max_values_for_field(
        &self,
        field: &str,
        value_counts: &[(String, u64)],
    ) -> bool {
        if !self.is_integer_field(field) {
            debug!(field, "not an integer field, no range recorded");
            return false;
        }

        let facet_config = self.config.facet_field(field);
        let window_min = facet_config.and_then(|f| f.range_min).unwrap_or(i64::MIN);
        let window_max = facet_config.and_then(|f| f.range_max).unwrap_or(i64::MAX);

        let mut counts = BTreeMap::new();
        for (value, count) in value_counts {
            match value.trim().parse::<i64>() {
                Ok(v) if (window_min..=window_max).contains(&v) => {
                    *counts.entry(v).or_insert(0) += count;
                }
                Ok(_) => {}
                Err(_) => warn!(field, value = %value, "ignoring non-integer range value"),
            }
        }

        let (Some(&min), Some(&max)) = (counts.keys().next(), counts.keys().next_back()) else {
            return false;
        };

        self.inner.lock().ranges.insert(
            field.to_string(),
            RangeValues {
                min,
                max,
                value_counts: counts,
            },
        );
        true
    }

    /// The recorded value distribution of a range field.
    pub fn range_values(&self, field: &str) -> Option<RangeValues> {
        self.inner.lock().ranges.get(field).cloned()
    }

    pub fn absolute_min_value(&self, field: &str) -> Option<i64> {
        self.inner.lock().ranges.get(field).map(|r| r.min)
    }

    pub fn absolute_max_value(&self, field: &str) -> Option<i64> {
        self.inner.lock().ranges.get(field).map(|r| r.max)
    }

    /// Forget all available facets.
    pub fn clear_available_facets(&self) {
        self.inner.lock().available.clear();
    }

    /// Add the histograms of a search response to the available facets.
    ///
    /// Histograms for `skip_field` (the group identity) and unnamed ones are
    /// skipped.
    pub fn populate_available_facets(&self, histograms: &[FacetHistogram], skip_field: &str) {
        let mut inner = self.inner.lock();
        for histogram in histograms {
            let Some(name) = histogram.name.as_deref() else {
                warn!("skipping facet histogram without a name");
                continue;
            };
            if name == skip_field {
                continue;
            }
            let field = defacetify(name);
            let items: Vec<FacetItem> = histogram
                .counts
                .iter()
                .filter_map(|(value, count)| {
                    FacetItem::from_link(&format!("{field}:{value}"), &self.config)
                        .map(|item| item.with_count(*count))
                })
                .collect();
            inner.available.insert(field, items);
        }
    }

    /// Available values of a field, excluding active ones unless
    /// `include_active` is set.
    pub fn available_facets_for_field(&self, field: &str, include_active: bool) -> Vec<FacetItem> {
        let inner = self.inner.lock();
        let Some(items) = inner.available.get(field) else {
            return Vec::new();
        };
        items
            .iter()
            .filter(|item| include_active || !inner.active.iter().any(|a| a.same_value(item)))
            .cloned()
            .collect()
    }

    /// Fields with available values, in the order they were populated.
    pub fn available_fields(&self) -> Vec<String> {
        self.inner.lock().available.keys().cloned().collect()
    }
}
