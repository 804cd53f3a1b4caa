//! Filter queries for active facets.

use indexmap::IndexMap;
use tracing::warn;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::facet::geo::GeoShape;
use crate::facet::item::{FacetItem, FacetItemKind};
use crate::query::escape::{escape_query_chars, quote};
use crate::query::fields::{boolify, facetify};

/// `(F:"v" OR F:v.*)` for one hierarchical facet.
fn hierarchical_clause(config: &SearchConfig, item: &FacetItem) -> Result<String> {
    let separator = config.splitting_char(&item.field)?;
    let field = facetify(&item.field);
    Ok(format!(
        "({field}:{} OR {field}:{}{}*)",
        quote(&item.value),
        escape_query_chars(&item.value),
        escape_query_chars(&separator)
    ))
}

/// The filter clause of a non-hierarchical facet, or `None` if it cannot be
/// expressed.
fn item_clause(item: &FacetItem) -> Option<String> {
    match item.kind {
        FacetItemKind::Simple => Some(format!("{}:{}", facetify(&item.field), quote(&item.value))),
        FacetItemKind::Range => {
            let to = item.value2.as_deref().unwrap_or(&item.value);
            Some(format!(
                "{}:[{} TO {}]",
                item.field,
                escape_query_chars(&item.value),
                escape_query_chars(to)
            ))
        }
        FacetItemKind::Boolean => Some(format!(
            "{}:{}",
            boolify(&item.field),
            item.value.trim().to_lowercase()
        )),
        // not drawn yet
        FacetItemKind::Geo if item.value.trim().is_empty() => None,
        FacetItemKind::Geo => match GeoShape::parse(&item.value) {
            Ok(shape) => Some(shape.to_filter_query(&item.field)),
            Err(err) => {
                warn!(field = %item.field, error = %err, "skipping invalid geo facet");
                None
            }
        },
    }
}

/// The combined filter of all active hierarchical facets, if any.
///
/// Several hierarchical facets are AND-combined.
pub fn generate_hierarchical_facet_filter_query(
    config: &SearchConfig,
    items: &[FacetItem],
) -> Result<Option<String>> {
    let clauses = items
        .iter()
        .filter(|item| item.hierarchical && !config.is_sub_element_field(&item.field))
        .map(|item| hierarchical_clause(config, item))
        .collect::<Result<Vec<_>>>()?;

    Ok(match clauses.len() {
        0 => None,
        1 => clauses.into_iter().next(),
        _ => Some(clauses.join(" AND ")),
    })
}

/// Filter queries for the active facets: the hierarchical filter first, then
/// one filter per remaining field.
///
/// Values of the same field are combined with the field's multi-value
/// operator. Range facets are left out unless `include_range` is set;
/// sub-element facets are always left out.
pub fn generate_facet_filter_queries(
    config: &SearchConfig,
    items: &[FacetItem],
    include_range: bool,
) -> Result<Vec<String>> {
    let mut queries = Vec::new();
    if let Some(hierarchical) = generate_hierarchical_facet_filter_query(config, items)? {
        queries.push(hierarchical);
    }

    let mut by_field: IndexMap<&str, Vec<String>> = IndexMap::new();
    for item in items {
        if item.hierarchical || config.is_sub_element_field(&item.field) {
            continue;
        }
        if item.kind == FacetItemKind::Range && !include_range {
            continue;
        }
        if let Some(clause) = item_clause(item) {
            by_field.entry(item.field.as_str()).or_default().push(clause);
        }
    }

    for (field, clauses) in by_field {
        if clauses.len() == 1 {
            queries.extend(clauses);
        } else {
            let operator = config.multi_value_operator(field).as_query_str();
            queries.push(format!("({})", clauses.join(operator)));
        }
    }

    Ok(queries)
}

/// Filter restricting child documents to the active sub-element facets.
///
/// Returns an empty string if none is active.
pub fn generate_sub_element_facet_filter_query(config: &SearchConfig, items: &[FacetItem]) -> String {
    items
        .iter()
        .filter(|item| config.is_sub_element_field(&item.field))
        .filter_map(item_clause)
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FacetFieldConfig, FacetKind, MultiValueOperator};
    use crate::error::VellumError;

    fn config() -> SearchConfig {
        SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical))
            .facet_field(
                FacetFieldConfig::new("MD_TOPIC", FacetKind::Hierarchical).splitting_char("/"),
            )
            .facet_field(FacetFieldConfig::new("YEAR", FacetKind::Range))
            .facet_field(
                FacetFieldConfig::new("MD_CREATOR", FacetKind::Regular)
                    .operator(MultiValueOperator::Or),
            )
            .facet_field(FacetFieldConfig::new("MD_PLACE", FacetKind::SubElement))
            .facet_field(FacetFieldConfig::new("WKT_COORDS", FacetKind::Geo))
            .build()
    }

    #[test]
    fn test_hierarchical_filter() {
        let items = vec![FacetItem::new("DC", "science.biology").hierarchical(true)];
        assert_eq!(
            generate_facet_filter_queries(&config(), &items, true).unwrap(),
            vec!["(DC:\"science.biology\" OR DC:science.biology.*)".to_string()]
        );
    }

    #[test]
    fn test_hierarchical_and_combined() {
        let items = vec![
            FacetItem::new("DC", "a").hierarchical(true),
            FacetItem::new("MD_TOPIC", "x/y").hierarchical(true),
        ];
        assert_eq!(
            generate_hierarchical_facet_filter_query(&config(), &items)
                .unwrap()
                .unwrap(),
            "(DC:\"a\" OR DC:a.*) AND (FACET_TOPIC:\"x/y\" OR FACET_TOPIC:x\\/y\\/*)"
        );
    }

    #[test]
    fn test_blank_splitting_char() {
        let config = SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical).splitting_char(""))
            .build();
        let items = vec![FacetItem::new("DC", "a").hierarchical(true)];
        assert!(matches!(
            generate_facet_filter_queries(&config, &items, true),
            Err(VellumError::Configuration(_))
        ));
    }

    #[test]
    fn test_simple_and_range() {
        let items = vec![
            FacetItem::new("MD_CREATOR", "Doe"),
            FacetItem::new("MD_CREATOR", "Roe"),
            FacetItem::new("DOCSTRCT", "monograph"),
            FacetItem::range("YEAR", "1900", "1950"),
        ];
        let config = config();

        assert_eq!(
            generate_facet_filter_queries(&config, &items, true).unwrap(),
            vec![
                "(FACET_CREATOR:\"Doe\" OR FACET_CREATOR:\"Roe\")".to_string(),
                "DOCSTRCT:\"monograph\"".to_string(),
                "YEAR:[1900 TO 1950]".to_string(),
            ]
        );
        assert_eq!(
            generate_facet_filter_queries(&config, &items, false)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_geo_and_boolean() {
        let items = vec![
            FacetItem::geo("WKT_COORDS", "10 50, 11 50, 11 51"),
            FacetItem {
                kind: FacetItemKind::Boolean,
                ..FacetItem::new("BOOL_IMAGEAVAILABLE", "TRUE")
            },
            FacetItem::geo("WKT_COORDS", "not a shape"),
        ];
        assert_eq!(
            generate_facet_filter_queries(&config(), &items, true).unwrap(),
            vec![
                "WKT_COORDS:\"Intersects(POLYGON((10 50, 11 50, 11 51, 10 50)))\"".to_string(),
                "BOOL_IMAGEAVAILABLE:true".to_string(),
            ]
        );
    }

    #[test]
    fn test_sub_element_filter() {
        let items = vec![
            FacetItem::new("MD_PLACE", "Rome"),
            FacetItem::new("MD_CREATOR", "Doe"),
        ];
        let config = config();
        assert_eq!(
            generate_sub_element_facet_filter_query(&config, &items),
            "FACET_PLACE:\"Rome\""
        );
        assert_eq!(
            generate_facet_filter_queries(&config, &items, true).unwrap(),
            vec!["FACET_CREATOR:\"Doe\"".to_string()]
        );
    }
}
