//! Final query assembly.
//!
//! [`QueryBuilder`] turns a prepared user query into the string sent to the
//! index service: an optional join prefix, the mandatory query clause and the
//! filter suffixes (static, collection blacklist, access rights, request).

use std::sync::Arc;

use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{Result, VellumError};
use crate::index::fields;
use crate::query::access::{AccessIdentity, personal_filter_query_suffix};
use crate::query::escape::{escape_query_chars, quote};
use crate::query::terms::SearchTerms;

/// Join prefix that maps matching child documents to their top-level record.
pub const AGGREGATION_QUERY_PREFIX: &str = "{!join from=PI_TOPSTRUCT to=PI}";

/// Document types returned as children of an aggregated hit.
const CHILD_DOC_TYPES: &[&str] = &["DOCSTRCT", "PAGE", "METADATA", "UGC", "EVENT"];

/// Check a raw query for unbalanced quotes and parentheses.
pub fn validate_query(query: &str) -> Result<()> {
    let mut in_quotes = false;
    let mut depth: usize = 0;
    let mut chars = query.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    VellumError::malformed_query(format!("unexpected ')' in {query}"))
                })?;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(VellumError::malformed_query(format!(
            "unbalanced quotes in {query}"
        )));
    }
    if depth > 0 {
        return Err(VellumError::malformed_query(format!(
            "unbalanced parentheses in {query}"
        )));
    }
    Ok(())
}

/// Builds index queries from user input and configuration.
///
/// The collection blacklist suffix only depends on configuration and is
/// computed once on construction.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: Arc<SearchConfig>,
    blacklist_suffix: String,
}

impl QueryBuilder {
    /// Create a builder for a configuration.
    pub fn new(config: Arc<SearchConfig>) -> Self {
        let blacklist_suffix = Self::collection_blacklist_suffix(&config);
        QueryBuilder {
            config,
            blacklist_suffix,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn collection_blacklist_suffix(config: &SearchConfig) -> String {
        let field = &config.collection_field;
        config
            .collection_blacklist
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                format!(
                    " -{field}:{} -{field}:{}.*",
                    quote(c.trim()),
                    escape_query_chars(c.trim())
                )
            })
            .collect()
    }

    /// The precomputed collection blacklist suffix.
    pub fn blacklist_suffix(&self) -> &str {
        &self.blacklist_suffix
    }

    /// Wrap a user query in parentheses, or substitute the top-level query
    /// when it is empty.
    pub fn prepare_query(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            format!("({})", self.config.top_level_query)
        } else {
            format!("({raw})")
        }
    }

    /// All filter suffixes for a request, each starting with a space.
    pub fn all_suffixes(
        &self,
        identity: &dyn AccessIdentity,
        request_filter: Option<&str>,
    ) -> String {
        let mut suffixes = String::new();
        let static_suffix = self.config.static_query_suffix.trim();
        if !static_suffix.is_empty() {
            suffixes.push(' ');
            suffixes.push_str(static_suffix);
        }
        suffixes.push_str(&self.blacklist_suffix);
        suffixes.push_str(&personal_filter_query_suffix(&self.config, identity));
        if let Some(filter) = request_filter.map(str::trim).filter(|f| !f.is_empty()) {
            suffixes.push_str(&format!(" +({filter})"));
        }
        suffixes
    }

    /// Require the active sub-element facets on a prepared query.
    ///
    /// Both parts become mandatory clauses. An empty filter leaves the query
    /// unchanged.
    pub fn with_sub_element_filter(
        &self,
        prepared_query: &str,
        sub_element_filter: &str,
    ) -> String {
        let filter = sub_element_filter.trim();
        if filter.is_empty() {
            return prepared_query.to_string();
        }
        format!("+{prepared_query} +({filter})")
    }

    /// Assemble the query sent to the index service.
    ///
    /// Any join prefix already present is removed and re-added only if
    /// `aggregate` is set.
    pub fn build_final_query(
        &self,
        query: &str,
        aggregate: bool,
        identity: &dyn AccessIdentity,
        request_filter: Option<&str>,
    ) -> String {
        let query = query.trim();
        let query = query
            .strip_prefix(AGGREGATION_QUERY_PREFIX)
            .unwrap_or(query)
            .trim();

        let mut final_query = String::with_capacity(query.len() + 128);
        if aggregate {
            final_query.push_str(AGGREGATION_QUERY_PREFIX);
        }
        final_query.push_str("+(");
        final_query.push_str(query);
        final_query.push(')');
        final_query.push_str(&self.all_suffixes(identity, request_filter));

        debug!(query = %final_query, aggregate, "built final query");
        final_query
    }

    /// Build the query selecting the child documents of aggregated hits.
    ///
    /// Only terms in the configured expand fields are used. Returns `None` if
    /// none of them were searched.
    pub fn build_expand_query(
        &self,
        terms: &SearchTerms,
        sub_element_filter: Option<&str>,
    ) -> Option<String> {
        let clauses: Vec<String> = self
            .config
            .expand_query_fields
            .iter()
            .filter_map(|field| {
                let values: Vec<String> = terms
                    .get(field)
                    .iter()
                    .map(|term| {
                        if term.contains(char::is_whitespace) {
                            quote(term)
                        } else {
                            term.clone()
                        }
                    })
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    Some(format!("{field}:({})", values.join(" ")))
                }
            })
            .collect();

        if clauses.is_empty() {
            return None;
        }

        Some(format!(
            "+({}) {}",
            clauses.join(" "),
            self.build_child_query(sub_element_filter)
        ))
    }

    /// Build the query selecting all child documents, narrowed by the active
    /// sub-element facets.
    pub fn build_child_query(&self, sub_element_filter: Option<&str>) -> String {
        let mut query = format!("+{}:({})", fields::DOCTYPE, CHILD_DOC_TYPES.join(" OR "));
        if let Some(filter) = sub_element_filter.map(str::trim).filter(|f| !f.is_empty()) {
            query.push_str(&format!(" +({filter})"));
        }
        query
    }
}
