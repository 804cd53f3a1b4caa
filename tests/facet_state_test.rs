//! Integration tests for facet state, facet strings and filter queries.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use tempfile::NamedTempFile;
use vellum::config::MultiValueOperator;
use vellum::facet::{FacetItemKind, decode_facet_string, encode_facet_string};
use vellum::prelude::*;
use vellum::query::{defacetify, facetify};

fn config() -> Arc<SearchConfig> {
    Arc::new(
        SearchConfig::builder()
            .facet_field(FacetFieldConfig::new("DC", FacetKind::Hierarchical))
            .facet_field(
                FacetFieldConfig::new("MD_CREATOR", FacetKind::Regular)
                    .operator(MultiValueOperator::Or),
            )
            .facet_field(FacetFieldConfig::new("YEAR", FacetKind::Range).range(1400, 2000))
            .facet_field(
                FacetFieldConfig::new("WKT_COORDS", FacetKind::Geo)
                    .geo_default("10 50, 11 50, 11 51"),
            )
            .facet_field(FacetFieldConfig::new("MD_LANGUAGE", FacetKind::SubElement))
            .build(),
    )
}

#[test]
fn test_hierarchical_facet_filter() -> Result<()> {
    let facets = FacetState::new(config());
    facets.set_active_facet_string("DC:science.biology");

    let active = facets.active_facets();
    assert_eq!(active.len(), 1);
    assert!(active[0].hierarchical);
    assert_eq!(
        facets.generate_hierarchical_facet_filter_query()?,
        Some("(DC:\"science.biology\" OR DC:science.biology.*)".to_string())
    );
    assert_eq!(
        facets.generate_facet_filter_queries(true)?,
        vec!["(DC:\"science.biology\" OR DC:science.biology.*)".to_string()]
    );
    assert_eq!(
        facets.hierarchy_of("DC", "science.biology")?,
        vec!["science".to_string(), "science.biology".to_string()]
    );
    Ok(())
}

#[test]
fn test_facet_string_round_trip() {
    let config = config();
    let facets = FacetState::new(config.clone());
    facets.set_active_facet_string(
        "DC:science.biology;;MD_CREATOR:Doe, Jane;;MD_CREATOR:Roe/Richard;;YEAR:1800;1900",
    );
    let items = facets.active_facets();
    assert_eq!(items.len(), 4);
    assert_eq!(items[2].value, "Roe/Richard");
    assert_eq!(items[3].kind, FacetItemKind::Range);

    let encoded = encode_facet_string(&items);
    assert!(!encoded.contains('/'));
    assert_eq!(decode_facet_string(&encoded, &config), items);

    let copy = FacetState::new(config);
    copy.set_active_facet_string(&facets.active_facet_string());
    assert_eq!(copy.active_facets(), items);
}

#[test]
fn test_filters_per_field() -> Result<()> {
    let facets = FacetState::new(config());
    facets.set_active_facet_string(
        "MD_CREATOR:Doe;;MD_CREATOR:Roe;;YEAR:1800;1900;;MD_LANGUAGE:ger",
    );

    let filters = facets.generate_facet_filter_queries(true)?;
    assert_eq!(
        filters,
        vec![
            "(FACET_CREATOR:\"Doe\" OR FACET_CREATOR:\"Roe\")".to_string(),
            "YEAR:[1800 TO 1900]".to_string(),
        ]
    );
    assert_eq!(
        facets.generate_facet_filter_queries(false)?,
        vec!["(FACET_CREATOR:\"Doe\" OR FACET_CREATOR:\"Roe\")".to_string()]
    );
    assert_eq!(
        facets.generate_sub_element_facet_filter_query(),
        "FACET_LANGUAGE:\"ger\""
    );
    Ok(())
}

#[test]
fn test_update_and_remove() {
    let facets = FacetState::new(config());
    facets.update_facet_item("YEAR", "1800;1850", false);
    facets.update_facet_item("YEAR", "1820;1830", false);
    assert_eq!(facets.active_facets().len(), 1);
    assert!(facets.is_facet_active("YEAR", "1820;1830"));

    assert!(facets.populate_absolute_min_max_values_for_field(
        "YEAR",
        &[("1820".to_string(), 4), ("2500".to_string(), 1)]
    ));
    assert_eq!(facets.absolute_max_value("YEAR"), Some(1820));

    assert!(facets.remove_facet_item("YEAR", "1820;1830"));
    assert!(!facets.is_field_active("YEAR"));
    assert!(facets.range_values("YEAR").is_none());
    assert_eq!(facets.active_facet_string(), "-");
}

#[test]
fn test_geo_facet_default() {
    let facets = FacetState::new(config());
    let geo = facets.get_geo_facet("WKT_COORDS").expect("geo field");
    assert_eq!(geo.kind, FacetItemKind::Geo);
    assert_eq!(facets.active_facets().len(), 1);
    assert_eq!(facets.get_geo_facet("WKT_COORDS"), Some(geo));
    assert_eq!(facets.active_facets().len(), 1);
    assert!(facets.get_geo_facet("DC").is_none());
}

#[test]
fn test_field_transform_bijection() {
    for field in ["MD_CREATOR", "MD2_PLACE", "MDNUM_PAGES", "NE_PERSON"] {
        assert_ne!(facetify(field), field);
        assert_eq!(defacetify(&facetify(field)), field);
    }
    for field in ["DC", "DOCSTRCT", "YEAR"] {
        assert_eq!(facetify(field), field);
    }
}

#[test]
fn test_concurrent_updates() {
    let facets = Arc::new(FacetState::new(config()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let facets = facets.clone();
            thread::spawn(move || {
                for j in 0..50 {
                    facets.update_facet_item("MD_CREATOR", &format!("author{i}-{j}"), false);
                    let _ = facets.generate_facet_filter_queries(true);
                    let _ = facets.active_facet_string();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread");
    }
    assert_eq!(facets.active_facets().len(), 1);
}

#[test]
fn test_config_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "aggregate_hits": true,
            "facet_fields": [
                {{ "field": "DC", "kind": "hierarchical", "splitting_char": "/" }}
            ]
        }}"#
    )?;

    let config = Arc::new(SearchConfig::from_json_file(file.path())?);
    assert!(config.aggregate_hits);
    let facets = FacetState::new(config);
    facets.set_active_facet_string("DC:a/b");
    assert_eq!(
        facets.generate_hierarchical_facet_filter_query()?,
        Some("(DC:\"a/b\" OR DC:a\\/b\\/*)".to_string())
    );
    Ok(())
}
