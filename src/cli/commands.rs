//! Command implementations for the Vellum CLI.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::facet::state::FacetState;
use crate::fuzzy::{FuzzySearchTerm, is_fuzzy_term};
use crate::highlight::{HighlightConfig, truncate_fulltext, truncate_fulltext_with_rng};
use crate::query::access::{AccessIdentity, LicenseHolder, Superuser};
use crate::query::builder::{AGGREGATION_QUERY_PREFIX, QueryBuilder};
use crate::query::sort::build_sort_fields;
use crate::query::terms::extract_search_terms;
use crate::util::levenshtein::damerau_levenshtein_distance;
use crate::util::normalize::clean_word;

/// Execute a CLI command.
pub fn execute_command(args: VellumArgs) -> Result<()> {
    match &args.command {
        Command::Query(query_args) => build_query(query_args, &args),
        Command::Highlight(highlight_args) => highlight(highlight_args, &args),
        Command::Fuzzy(fuzzy_args) => fuzzy(fuzzy_args, &args),
        Command::Facets(facets_args) => facets(facets_args, &args),
    }
}

/// Load the search configuration, or the defaults if no file is given.
fn load_config(path: Option<&Path>) -> Result<SearchConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading search configuration");
            SearchConfig::from_json_file(path)
        }
        None => Ok(SearchConfig::default()),
    }
}

fn build_query(args: &QueryArgs, cli_args: &VellumArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.aggregate {
        config.aggregate_hits = true;
    }
    let config = Arc::new(config);
    let identity: Box<dyn AccessIdentity> = if args.superuser {
        Box::new(Superuser)
    } else {
        Box::new(LicenseHolder::new(args.licenses.iter().cloned()))
    };

    let terms = extract_search_terms(&args.query)?;
    let facets = FacetState::new(config.clone());
    facets.set_active_facet_string(&args.facets);

    let builder = QueryBuilder::new(config.clone());
    let raw = args.query.trim();
    let raw = raw.strip_prefix(AGGREGATION_QUERY_PREFIX).unwrap_or(raw);
    let sub_element_filter = facets.generate_sub_element_facet_filter_query();
    let final_query = builder.build_final_query(
        &builder.with_sub_element_filter(&builder.prepare_query(raw), &sub_element_filter),
        config.aggregate_hits,
        identity.as_ref(),
        args.filter.as_deref(),
    );

    let expand_query = if config.aggregate_hits {
        builder.build_expand_query(&terms, Some(&sub_element_filter))
    } else {
        None
    };

    let sort_fields = build_sort_fields(&config.static_sort_fields, &args.sort, &mut rand::rng())?;

    let report = QueryReport {
        final_query,
        filter_queries: facets.generate_facet_filter_queries(true)?,
        expand_query,
        sort_fields: sort_fields.iter().map(|f| f.to_param()).collect(),
        search_terms: terms
            .fields()
            .map(|field| (field.to_string(), terms.get(field).to_vec()))
            .collect(),
    };
    output_result("Query built", &report, cli_args)
}

fn highlight(args: &HighlightArgs, cli_args: &VellumArgs) -> Result<()> {
    let text = match (&args.text, &args.file) {
        (_, Some(file)) => fs::read_to_string(file)?,
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };

    let config = HighlightConfig::new()
        .tag(&args.tag, None)
        .fragment_length(args.length);
    let fragments = match args.seed {
        Some(seed) => truncate_fulltext_with_rng(
            &config,
            &args.terms,
            &text,
            args.length,
            args.first_only,
            args.fallback,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => truncate_fulltext(
            &config,
            &args.terms,
            &text,
            args.length,
            args.first_only,
            args.fallback,
        ),
    };

    let report = HighlightReport {
        terms: args.terms.clone(),
        fragments: fragments
            .iter()
            .map(|fragment| config.replace_markers(fragment))
            .collect(),
    };
    output_result("Fragments", &report, cli_args)
}

fn fuzzy(args: &FuzzyArgs, cli_args: &VellumArgs) -> Result<()> {
    let term = FuzzySearchTerm::parse(&args.term)
        .unwrap_or_else(|| FuzzySearchTerm::with_optimal_distance(&args.term));

    let report = FuzzyReport {
        term: term.full_term().to_string(),
        text: args.text.clone(),
        is_fuzzy_term: is_fuzzy_term(&args.term),
        max_distance: term.max_distance(),
        distance: damerau_levenshtein_distance(&clean_word(term.term()), &clean_word(&args.text)),
        matches: term.matches(&args.text),
    };
    output_result("Fuzzy match", &report, cli_args)
}

fn facets(args: &FacetsArgs, cli_args: &VellumArgs) -> Result<()> {
    let config = Arc::new(load_config(args.config.as_deref())?);
    let facets = FacetState::new(config);
    facets.set_active_facet_string(&args.facet_string);

    let filter_queries = if args.filters {
        Some(facets.generate_facet_filter_queries(true)?)
    } else {
        None
    };

    let report = FacetsReport {
        facet_string: facets.active_facet_string(),
        items: facets.active_facets(),
        filter_queries,
    };
    output_result("Active facets", &report, cli_args)
}
