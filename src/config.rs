//! Search configuration.
//!
//! [`SearchConfig`] carries every value the query builder, facet state,
//! highlighter and hit aggregator need. It is usually loaded from JSON and
//! never mutated afterwards.
//!
//! # Example
//!
//! ```
//! use vellum::config::{FacetFieldConfig, FacetKind, SearchConfig};
//!
//! let config = SearchConfig::builder()
//!     .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical))
//!     .facet_field(FacetFieldConfig::new("YEAR", FacetKind::Range).range(1400, 2100))
//!     .aggregate_hits(true)
//!     .build();
//!
//! assert!(config.is_hierarchical_field("DC"));
//! assert!(config.is_range_field("YEAR"));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VellumError};
use crate::index::fields;

/// Name of the fallback metadata template.
pub const DEFAULT_TEMPLATE: &str = "_DEFAULT";

/// How a facet field is filtered and rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    /// Plain `field:value` facet.
    #[default]
    Regular,
    /// Dotted path values where a parent matches its descendants.
    Hierarchical,
    /// Integer range rendered as a slider.
    Range,
    /// Geographic shape.
    Geo,
    /// `true`/`false` field.
    Boolean,
    /// Facet computed over child documents rather than records.
    SubElement,
}

/// Operator combining several active values of the same field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MultiValueOperator {
    #[default]
    And,
    Or,
}

impl MultiValueOperator {
    /// The operator as written in a query, padded with spaces.
    pub fn as_query_str(&self) -> &'static str {
        match self {
            MultiValueOperator::And => " AND ",
            MultiValueOperator::Or => " OR ",
        }
    }
}

/// Configuration of a single facet field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetFieldConfig {
    /// Index field name, without facet prefix (e.g. `MD_CREATOR`, `DC`).
    pub field: String,
    #[serde(default)]
    pub kind: FacetKind,
    /// Separator between hierarchy levels of hierarchical values.
    #[serde(default)]
    pub splitting_char: Option<String>,
    #[serde(default)]
    pub multi_value_operator: MultiValueOperator,
    /// Lower bound of the slider window for range fields.
    #[serde(default)]
    pub range_min: Option<i64>,
    /// Upper bound of the slider window for range fields.
    #[serde(default)]
    pub range_max: Option<i64>,
    /// Shape used when a geo facet is requested before one was drawn.
    #[serde(default)]
    pub geo_default: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl FacetFieldConfig {
    /// Create a facet field configuration with defaults.
    ///
    /// Hierarchy levels are separated by `.` unless set otherwise.
    pub fn new<S: Into<String>>(field: S, kind: FacetKind) -> Self {
        FacetFieldConfig {
            field: field.into(),
            kind,
            splitting_char: Some(".".to_string()),
            multi_value_operator: MultiValueOperator::default(),
            range_min: None,
            range_max: None,
            geo_default: None,
            label: None,
        }
    }

    /// Set the hierarchy separator.
    pub fn splitting_char<S: Into<String>>(mut self, splitting_char: S) -> Self {
        self.splitting_char = Some(splitting_char.into());
        self
    }

    /// Set the multi-value operator.
    pub fn operator(mut self, operator: MultiValueOperator) -> Self {
        self.multi_value_operator = operator;
        self
    }

    /// Set the slider window.
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.range_min = Some(min);
        self.range_max = Some(max);
        self
    }

    /// Set the default geo shape.
    pub fn geo_default<S: Into<String>>(mut self, shape: S) -> Self {
        self.geo_default = Some(shape.into());
        self
    }

    /// Set the display label.
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A license type that restricts listing of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTypeConfig {
    /// Value of the `ACCESSCONDITION` field.
    pub name: String,
    /// Records may be listed by everyone, only their content is restricted.
    #[serde(default)]
    pub open_listing: bool,
    /// Records become open once their public release date has passed.
    #[serde(default)]
    pub moving_wall: bool,
    /// License types that take precedence over this one on the same record.
    #[serde(default)]
    pub overriding_license_types: Vec<String>,
}

impl LicenseTypeConfig {
    /// Create a restricted license type.
    pub fn new<S: Into<String>>(name: S) -> Self {
        LicenseTypeConfig {
            name: name.into(),
            open_listing: false,
            moving_wall: false,
            overriding_license_types: Vec::new(),
        }
    }

    /// Allow listing for everyone.
    pub fn open_listing(mut self, open_listing: bool) -> Self {
        self.open_listing = open_listing;
        self
    }

    /// Mark as a moving-wall license.
    pub fn moving_wall(mut self, moving_wall: bool) -> Self {
        self.moving_wall = moving_wall;
        self
    }

    /// Add a license type that overrides this one.
    pub fn overridden_by<S: Into<String>>(mut self, name: S) -> Self {
        self.overriding_license_types.push(name.into());
        self
    }
}

/// Complete configuration of the search core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Query substituted for an empty user query.
    pub top_level_query: String,
    /// Filter appended to every final query, verbatim.
    pub static_query_suffix: String,
    /// Collections hidden from search results.
    pub collection_blacklist: Vec<String>,
    /// Field holding the collection values.
    pub collection_field: String,
    pub facet_fields: Vec<FacetFieldConfig>,
    /// Join child hits up to their owning record.
    pub aggregate_hits: bool,
    /// Group identity field used to collapse duplicate hits.
    pub group_field: String,
    /// Sort fields applied before any user sort.
    pub static_sort_fields: Vec<String>,
    pub license_types: Vec<LicenseTypeConfig>,
    /// Date field checked by moving-wall licenses.
    pub moving_wall_field: String,
    /// Target length of full-text fragments, in characters.
    pub fragment_length: usize,
    /// Terms never highlighted in fragments.
    pub stopwords: Vec<String>,
    /// Markup replacing the highlight start sentinel.
    pub highlight_start: String,
    /// Markup replacing the highlight end sentinel.
    pub highlight_end: String,
    /// Docstruct type to displayed fields; `_DEFAULT` is the fallback.
    pub metadata_templates: HashMap<String, Vec<String>>,
    /// Fields never reported as found metadata.
    pub ignored_found_metadata_fields: Vec<String>,
    /// Children populated when a hit is first created.
    pub child_hits_initial_load: usize,
    /// Maximum number of child documents fetched per record.
    pub child_hits_expand_limit: usize,
    /// Fields whose terms restrict the child document query.
    pub expand_query_fields: Vec<String>,
    /// Columns of exported result tables.
    pub export_fields: Vec<String>,
    /// Thumbnail URL with `{pi}` and `{file}` placeholders.
    pub thumbnail_url_template: String,
    /// Locale to field to translated label.
    pub field_labels: HashMap<String, HashMap<String, String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            top_level_query: format!("{}:true OR {}:true", fields::ISWORK, fields::ISANCHOR),
            static_query_suffix: String::new(),
            collection_blacklist: Vec::new(),
            collection_field: fields::DC.to_string(),
            facet_fields: Vec::new(),
            aggregate_hits: false,
            group_field: fields::GROUPFIELD.to_string(),
            static_sort_fields: Vec::new(),
            license_types: Vec::new(),
            moving_wall_field: "DATE_PUBLICRELEASEDATE".to_string(),
            fragment_length: 200,
            stopwords: Vec::new(),
            highlight_start: "<span class=\"search-list--highlight\">".to_string(),
            highlight_end: "</span>".to_string(),
            metadata_templates: HashMap::new(),
            ignored_found_metadata_fields: vec![
                fields::PI.to_string(),
                fields::PI_TOPSTRUCT.to_string(),
                fields::IDDOC.to_string(),
                fields::DOCSTRCT.to_string(),
                fields::FILENAME.to_string(),
            ],
            child_hits_initial_load: 5,
            child_hits_expand_limit: 1000,
            expand_query_fields: vec![
                fields::FULLTEXT.to_string(),
                fields::UGCTERMS.to_string(),
                fields::DEFAULT.to_string(),
            ],
            export_fields: vec![fields::PI.to_string(), fields::LABEL.to_string()],
            thumbnail_url_template: "/api/records/{pi}/files/images/{file}/full/!200,200/0/default.jpg"
                .to_string(),
            field_labels: HashMap::new(),
        }
    }
}

impl SearchConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check the values that cannot be given a sensible default.
    pub fn validate(&self) -> Result<()> {
        if self.group_field.trim().is_empty() {
            return Err(VellumError::configuration("group_field must not be blank"));
        }
        if self.top_level_query.trim().is_empty() {
            return Err(VellumError::configuration(
                "top_level_query must not be blank",
            ));
        }
        for facet in &self.facet_fields {
            if facet.field.trim().is_empty() {
                return Err(VellumError::configuration("facet field name is blank"));
            }
            if let (Some(min), Some(max)) = (facet.range_min, facet.range_max) {
                if min > max {
                    return Err(VellumError::configuration(format!(
                        "range window of {} is inverted ({min} > {max})",
                        facet.field
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up the configuration of a facet field.
    pub fn facet_field(&self, field: &str) -> Option<&FacetFieldConfig> {
        self.facet_fields.iter().find(|f| f.field == field)
    }

    fn field_kind(&self, field: &str) -> FacetKind {
        self.facet_field(field)
            .map(|f| f.kind)
            .unwrap_or(FacetKind::Regular)
    }

    pub fn is_hierarchical_field(&self, field: &str) -> bool {
        self.field_kind(field) == FacetKind::Hierarchical
    }

    pub fn is_range_field(&self, field: &str) -> bool {
        self.field_kind(field) == FacetKind::Range
    }

    pub fn is_geo_field(&self, field: &str) -> bool {
        self.field_kind(field) == FacetKind::Geo
    }

    pub fn is_boolean_field(&self, field: &str) -> bool {
        self.field_kind(field) == FacetKind::Boolean || field.starts_with("BOOL_")
    }

    pub fn is_sub_element_field(&self, field: &str) -> bool {
        self.field_kind(field) == FacetKind::SubElement
    }

    /// Fields of the given kind, in configuration order.
    pub fn fields_of_kind(&self, kind: FacetKind) -> Vec<&str> {
        self.facet_fields
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.field.as_str())
            .collect()
    }

    /// The hierarchy separator of a field.
    ///
    /// Fails if the field has no separator configured or it is blank.
    pub fn splitting_char(&self, field: &str) -> Result<String> {
        match self
            .facet_field(field)
            .and_then(|f| f.splitting_char.as_deref())
        {
            Some(splitting_char) if !splitting_char.trim().is_empty() => {
                Ok(splitting_char.to_string())
            }
            _ => Err(VellumError::configuration(format!(
                "no splitting character configured for {field}"
            ))),
        }
    }

    /// The multi-value operator of a field.
    pub fn multi_value_operator(&self, field: &str) -> MultiValueOperator {
        self.facet_field(field)
            .map(|f| f.multi_value_operator)
            .unwrap_or_default()
    }

    /// The display template for a docstruct type, falling back to `_DEFAULT`.
    pub fn metadata_template(&self, docstrct: &str) -> &[String] {
        self.metadata_templates
            .get(docstrct)
            .or_else(|| self.metadata_templates.get(DEFAULT_TEMPLATE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a license type by name.
    pub fn license_type(&self, name: &str) -> Option<&LicenseTypeConfig> {
        self.license_types.iter().find(|l| l.name == name)
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        SearchConfigBuilder {
            config: SearchConfig::default(),
        }
    }

    /// Set the query used for empty user queries.
    pub fn top_level_query(mut self, query: impl Into<String>) -> Self {
        self.config.top_level_query = query.into();
        self
    }

    /// Set the static filter suffix.
    pub fn static_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.static_query_suffix = suffix.into();
        self
    }

    /// Hide a collection from all results.
    pub fn blacklist_collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection_blacklist.push(collection.into());
        self
    }

    /// Add a facet field.
    pub fn facet_field(mut self, facet: FacetFieldConfig) -> Self {
        self.config.facet_fields.push(facet);
        self
    }

    /// Enable or disable hit aggregation.
    pub fn aggregate_hits(mut self, aggregate: bool) -> Self {
        self.config.aggregate_hits = aggregate;
        self
    }

    /// Add a static sort field (`!` prefix for descending).
    pub fn static_sort_field(mut self, field: impl Into<String>) -> Self {
        self.config.static_sort_fields.push(field.into());
        self
    }

    /// Add a license type.
    pub fn license_type(mut self, license: LicenseTypeConfig) -> Self {
        self.config.license_types.push(license);
        self
    }

    /// Set the fragment length.
    pub fn fragment_length(mut self, length: usize) -> Self {
        self.config.fragment_length = length;
        self
    }

    /// Set the stopwords.
    pub fn stopwords(mut self, stopwords: Vec<String>) -> Self {
        self.config.stopwords = stopwords;
        self
    }

    /// Set the highlight markup.
    pub fn highlight_markup(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.highlight_start = start.into();
        self.config.highlight_end = end.into();
        self
    }

    /// Set the display template of a docstruct type.
    pub fn metadata_template(mut self, docstrct: impl Into<String>, fields: Vec<String>) -> Self {
        self.config.metadata_templates.insert(docstrct.into(), fields);
        self
    }

    /// Set the number of children populated with each new hit.
    pub fn child_hits_initial_load(mut self, count: usize) -> Self {
        self.config.child_hits_initial_load = count;
        self
    }

    /// Set the export columns.
    pub fn export_fields(mut self, fields: Vec<String>) -> Self {
        self.config.export_fields = fields;
        self
    }

    /// Add a translated field label.
    pub fn field_label(
        mut self,
        locale: impl Into<String>,
        field: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.config
            .field_labels
            .entry(locale.into())
            .or_default()
            .insert(field.into(), label.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.top_level_query, "ISWORK:true OR ISANCHOR:true");
        assert_eq!(config.group_field, "GROUPFIELD");
        assert!(!config.aggregate_hits);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_field_kinds() {
        let config = SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical))
            .facet_field(FacetFieldConfig::new("WKT_COORDS", FacetKind::Geo))
            .facet_field(FacetFieldConfig::new("MD_PLACE", FacetKind::SubElement))
            .build();

        assert!(config.is_hierarchical_field("DC"));
        assert!(config.is_geo_field("WKT_COORDS"));
        assert!(config.is_sub_element_field("MD_PLACE"));
        assert!(config.is_boolean_field("BOOL_WKT_COORDS"));
        assert!(!config.is_range_field("DC"));
        assert_eq!(config.fields_of_kind(FacetKind::Geo), vec!["WKT_COORDS"]);
    }

    #[test]
    fn test_blank_splitting_char_is_error() {
        let config = SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical).splitting_char(" "))
            .build();
        let err = config.splitting_char("DC").unwrap_err();
        assert!(matches!(err, VellumError::Configuration(_)));

        let err = SearchConfig::default().splitting_char("DC").unwrap_err();
        assert!(matches!(err, VellumError::Configuration(_)));

        let config = SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical))
            .build();
        assert_eq!(config.splitting_char("DC").unwrap(), ".");
    }

    #[test]
    fn test_splitting_char_absent_from_json() {
        let config: SearchConfig = serde_json::from_str(
            r#"{ "facet_fields": [ { "field": "DC", "kind": "hierarchical" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.facet_fields[0].splitting_char, None);
        let err = config.splitting_char("DC").unwrap_err();
        assert!(matches!(err, VellumError::Configuration(_)));
    }

    #[test]
    fn test_metadata_template_fallback() {
        let config = SearchConfig::builder()
            .metadata_template(DEFAULT_TEMPLATE, vec!["MD_TITLE".to_string()])
            .metadata_template("monograph", vec!["MD_AUTHOR".to_string()])
            .build();
        assert_eq!(config.metadata_template("monograph"), ["MD_AUTHOR".to_string()]);
        assert_eq!(config.metadata_template("map"), ["MD_TITLE".to_string()]);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "aggregate_hits": true,
                "facet_fields": [
                    {{ "field": "DC", "kind": "hierarchical" }},
                    {{ "field": "YEAR", "kind": "range", "range_min": 1400, "range_max": 2100 }},
                    {{ "field": "MD_CREATOR", "multi_value_operator": "OR" }}
                ],
                "license_types": [
                    {{ "name": "restricted", "overriding_license_types": ["embargo"] }}
                ]
            }}"#
        )
        .unwrap();

        let config = SearchConfig::from_json_file(file.path()).unwrap();
        assert!(config.aggregate_hits);
        assert_eq!(config.facet_field("YEAR").unwrap().range_max, Some(2100));
        assert_eq!(
            config.multi_value_operator("MD_CREATOR"),
            MultiValueOperator::Or
        );
        assert_eq!(
            config.license_type("restricted").unwrap().overriding_license_types,
            vec!["embargo".to_string()]
        );
        assert_eq!(config.top_level_query, "ISWORK:true OR ISANCHOR:true");
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let json = r#"{ "facet_fields": [ { "field": "YEAR", "kind": "range", "range_min": 10, "range_max": 1 } ] }"#;
        assert!(SearchConfig::from_json_str(json).is_err());
    }
}
