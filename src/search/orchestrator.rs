//! Execution of a search against the index service.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::{FacetKind, SearchConfig};
use crate::error::Result;
use crate::facet::state::FacetState;
use crate::hit::aggregator::{HitAggregator, SearchHit};
use crate::hit::found_metadata::Translator;
use crate::index::fields;
use crate::index::service::{
    ExpandParams, FulltextLoader, IndexRequest, IndexResponse, IndexService,
};
use crate::query::access::AccessIdentity;
use crate::query::builder::{AGGREGATION_QUERY_PREFIX, QueryBuilder, validate_query};
use crate::query::fields::{defacetify, facetify};
use crate::query::sort::{SortField, build_sort_fields};
use crate::query::terms::{SearchTerms, extract_search_terms};
use crate::search::execution::{SearchExecution, last_page};
use crate::search::saved::SavedSearch;

/// Parameters of one search execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// The raw user query; empty lists all top-level records.
    pub query: String,
    /// Requested page, starting at 1. Clamped to the available pages.
    pub page: usize,
    pub hits_per_page: usize,
    /// User sort string, e.g. `SORT_TITLE;!YEAR`.
    pub sort_string: String,
    pub locale: String,
    /// Request-scoped filter appended to the final query.
    pub request_filter: Option<String>,
    /// Hit count of an earlier execution of the same search. Zero runs the
    /// probe and counting searches.
    pub known_hits_count: u64,
}

impl SearchRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            page: 1,
            hits_per_page: 10,
            sort_string: String::new(),
            locale: "en".to_string(),
            request_filter: None,
            known_hits_count: 0,
        }
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn hits_per_page(mut self, hits_per_page: usize) -> Self {
        self.hits_per_page = hits_per_page;
        self
    }

    pub fn sort<S: Into<String>>(mut self, sort_string: S) -> Self {
        self.sort_string = sort_string.into();
        self
    }

    pub fn locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn request_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.request_filter = Some(filter.into());
        self
    }

    pub fn known_hits_count(mut self, hits_count: u64) -> Self {
        self.known_hits_count = hits_count;
        self
    }
}

/// Queries shared by all round trips of one execution.
struct PreparedSearch {
    final_query: String,
    expand_query: Option<String>,
    sub_element_query: Option<String>,
    terms: SearchTerms,
    filter_queries: Vec<String>,
    filter_queries_without_range: Vec<String>,
}

/// Drives facet state, query construction, the index service and hit
/// assembly for a search.
pub struct SearchOrchestrator {
    config: Arc<SearchConfig>,
    query_builder: QueryBuilder,
    index: Arc<dyn IndexService>,
    aggregator: HitAggregator,
}

impl SearchOrchestrator {
    pub fn new(config: Arc<SearchConfig>, index: Arc<dyn IndexService>) -> Self {
        SearchOrchestrator {
            query_builder: QueryBuilder::new(config.clone()),
            aggregator: HitAggregator::new(config.clone(), index.clone()),
            config,
            index,
        }
    }

    pub fn with_fulltext_loader(mut self, loader: Arc<dyn FulltextLoader>) -> Self {
        self.aggregator = self.aggregator.with_fulltext_loader(loader);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.aggregator = self.aggregator.with_translator(translator);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.query_builder
    }

    pub fn aggregator(&self) -> &HitAggregator {
        &self.aggregator
    }

    /// Run a search and return the requested page of hits.
    ///
    /// On the first execution (`known_hits_count == 0`) the absolute ranges
    /// of range facets are probed without range filters, sub-element facets
    /// are counted for aggregated searches, and the hits are counted with
    /// duplicates collapsed on the group field. The histograms of the
    /// counting search become the available facets.
    pub fn execute(
        &self,
        request: &SearchRequest,
        facets: &FacetState,
        identity: &dyn AccessIdentity,
    ) -> Result<SearchExecution> {
        self.execute_with_rng(request, facets, identity, &mut rand::rng())
    }

    /// [`execute`](Self::execute) with an explicit generator for random sort
    /// orders.
    pub fn execute_with_rng<R: Rng>(
        &self,
        request: &SearchRequest,
        facets: &FacetState,
        identity: &dyn AccessIdentity,
        rng: &mut R,
    ) -> Result<SearchExecution> {
        let aggregate = self.config.aggregate_hits;
        let prepared = self.prepare(request, facets, identity, aggregate)?;

        let hits_count = if request.known_hits_count == 0 {
            self.probe_ranges(&prepared, facets)?;
            facets.clear_available_facets();
            if aggregate {
                self.fetch_sub_element_facets(&prepared, facets)?;
            }
            self.count(&prepared, facets)?
        } else {
            request.known_hits_count
        };

        let mut execution = SearchExecution {
            final_query: prepared.final_query.clone(),
            expand_query: prepared.expand_query.clone(),
            sort_fields: build_sort_fields(
                &self.config.static_sort_fields,
                &request.sort_string,
                rng,
            )?,
            page: 1,
            hits_per_page: request.hits_per_page,
            hits_count,
            hits: Vec::new(),
            search_terms: prepared.terms.clone(),
            aggregated: aggregate,
        };
        execution.page = request.page.clamp(1, last_page(hits_count, request.hits_per_page));

        if hits_count > 0 && request.hits_per_page > 0 {
            let hits = self.fetch(&prepared, &execution, &request.locale)?;
            execution.hits.extend(hits);
        }

        info!(
            hits_count,
            page = execution.page,
            hits = execution.hits.len(),
            "search executed"
        );
        Ok(execution)
    }

    /// Populate the next batch of children of an aggregated hit.
    pub fn expand_children(&self, hit: &mut SearchHit, locale: &str) -> Result<()> {
        let skip = hit.hits_populated();
        self.aggregator
            .populate_children(hit, self.config.child_hits_expand_limit, skip, locale)
    }

    /// Check a saved search for records added since its last execution.
    ///
    /// Returns the newest records, most recent first, and updates the saved
    /// hit count. Nothing is fetched unless the count grew.
    pub fn find_new_hits(
        &self,
        saved: &mut SavedSearch,
        identity: &dyn AccessIdentity,
    ) -> Result<Vec<SearchHit>> {
        let facets = FacetState::new(self.config.clone());
        facets.set_active_facet_string(&saved.facet_string);
        let request = SearchRequest::new(saved.query.clone());
        let prepared = self.prepare(&request, &facets, identity, false)?;

        let count_request = IndexRequest::new(prepared.final_query.clone())
            .filter_queries(prepared.filter_queries.clone())
            .collapse_on(self.config.group_field.clone());
        let hits_count = self.round_trip("new hits count", &count_request)?.num_found;

        if hits_count <= saved.last_hits_count {
            if hits_count < saved.last_hits_count {
                saved.record_hits_count(hits_count);
            }
            return Ok(Vec::new());
        }

        let new_count = usize::try_from(hits_count - saved.last_hits_count).unwrap_or(usize::MAX);
        let fetch_request = IndexRequest::new(prepared.final_query.clone())
            .filter_queries(prepared.filter_queries.clone())
            .sort_fields(vec![SortField::desc(fields::DATECREATED)])
            .page(0, new_count);
        let response = self.round_trip("new hits fetch", &fetch_request)?;

        let hits = self.build_hits(response, &prepared.terms, &request.locale, false)?;
        saved.record_hits_count(hits_count);
        info!(new_hits = hits.len(), hits_count, "new hits found");
        Ok(hits)
    }

    fn prepare(
        &self,
        request: &SearchRequest,
        facets: &FacetState,
        identity: &dyn AccessIdentity,
        aggregate: bool,
    ) -> Result<PreparedSearch> {
        validate_query(&request.query)?;
        let terms = extract_search_terms(&request.query)?;

        let raw = request.query.trim();
        let raw = raw.strip_prefix(AGGREGATION_QUERY_PREFIX).unwrap_or(raw);
        let sub_element_filter = facets.generate_sub_element_facet_filter_query();
        let prepared_query = self
            .query_builder
            .with_sub_element_filter(&self.query_builder.prepare_query(raw), &sub_element_filter);
        let final_query = self.query_builder.build_final_query(
            &prepared_query,
            aggregate,
            identity,
            request.request_filter.as_deref(),
        );

        let filter_queries = facets.generate_facet_filter_queries(true)?;
        let filter_queries_without_range = facets.generate_facet_filter_queries(false)?;
        let (expand_query, sub_element_query) = if aggregate {
            let expand_query = self
                .query_builder
                .build_expand_query(&terms, Some(&sub_element_filter));
            let sub_element_query = match &expand_query {
                Some(query) => Some(query.clone()),
                None if terms.is_empty() => {
                    Some(self.query_builder.build_child_query(Some(&sub_element_filter)))
                }
                None => None,
            };
            (expand_query, sub_element_query)
        } else {
            (None, None)
        };

        Ok(PreparedSearch {
            final_query,
            expand_query,
            sub_element_query,
            terms,
            filter_queries,
            filter_queries_without_range,
        })
    }

    /// Facet names of the configured fields matching `kind`.
    fn facet_names<F>(&self, kind: F) -> Vec<String>
    where
        F: Fn(FacetKind) -> bool,
    {
        self.config
            .facet_fields
            .iter()
            .filter(|f| kind(f.kind))
            .map(|f| facetify(&f.field))
            .collect()
    }

    fn round_trip(&self, purpose: &str, request: &IndexRequest) -> Result<IndexResponse> {
        debug!(
            purpose,
            query = %request.query,
            filters = request.filter_queries.len(),
            rows = request.rows,
            "index round trip"
        );
        self.index.search(request).inspect_err(|e| {
            error!(purpose, error = %e, "index search failed");
        })
    }

    /// Record the unfiltered value ranges of all range facets.
    fn probe_ranges(&self, prepared: &PreparedSearch, facets: &FacetState) -> Result<()> {
        let request = IndexRequest::new(prepared.final_query.clone())
            .filter_queries(prepared.filter_queries_without_range.clone())
            .facet_fields(self.facet_names(|kind| kind == FacetKind::Range));
        let response = self.round_trip("range probe", &request)?;

        for histogram in &response.facet_fields {
            let Some(name) = histogram.name.as_deref() else {
                warn!("skipping range histogram without a name");
                continue;
            };
            facets.populate_absolute_min_max_values_for_field(&defacetify(name), &histogram.counts);
        }
        Ok(())
    }

    /// Count child documents per sub-element facet value.
    ///
    /// Without an expand query, an empty search counts over all child
    /// documents. Other searches skip the request.
    fn fetch_sub_element_facets(
        &self,
        prepared: &PreparedSearch,
        facets: &FacetState,
    ) -> Result<()> {
        let facet_fields = self.facet_names(|kind| kind == FacetKind::SubElement);
        let Some(query) = prepared.sub_element_query.as_ref() else {
            return Ok(());
        };
        if facet_fields.is_empty() {
            return Ok(());
        }

        let request = IndexRequest::new(query.clone()).facet_fields(facet_fields);
        let response = self.round_trip("sub-element facets", &request)?;
        facets.populate_available_facets(&response.facet_fields, &self.config.group_field);
        Ok(())
    }

    fn count(&self, prepared: &PreparedSearch, facets: &FacetState) -> Result<u64> {
        let request = IndexRequest::new(prepared.final_query.clone())
            .filter_queries(prepared.filter_queries.clone())
            .facet_fields(self.facet_names(|kind| kind != FacetKind::SubElement))
            .collapse_on(self.config.group_field.clone());
        let response = self.round_trip("count", &request)?;
        facets.populate_available_facets(&response.facet_fields, &self.config.group_field);
        Ok(response.num_found)
    }

    fn fetch(
        &self,
        prepared: &PreparedSearch,
        execution: &SearchExecution,
        locale: &str,
    ) -> Result<Vec<SearchHit>> {
        let mut request = IndexRequest::new(prepared.final_query.clone())
            .filter_queries(prepared.filter_queries.clone())
            .sort_fields(execution.sort_fields.clone())
            .page(execution.first_hit_index(), execution.hits_per_page);
        if let Some(expand_query) = &prepared.expand_query {
            request = request.expand(ExpandParams {
                query: expand_query.clone(),
                filter_queries: Vec::new(),
                field: fields::PI_TOPSTRUCT.to_string(),
                rows: self.config.child_hits_expand_limit,
            });
        }

        let purpose = if execution.aggregated {
            "aggregated fetch"
        } else {
            "fetch"
        };
        let response = self.round_trip(purpose, &request)?;
        self.build_hits(response, &prepared.terms, locale, execution.aggregated)
    }

    fn build_hits(
        &self,
        mut response: IndexResponse,
        terms: &SearchTerms,
        locale: &str,
        aggregated: bool,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::with_capacity(response.documents.len());
        for doc in std::mem::take(&mut response.documents) {
            let pi = doc.pi_topstruct().map(str::to_string);
            let mut hit = match self.aggregator.create_result_hit(doc, locale, terms) {
                Ok(hit) => hit,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "skipping hit");
                    continue;
                }
            };

            if aggregated {
                let child_docs = pi
                    .and_then(|pi| response.expanded.remove(&pi))
                    .unwrap_or_default();
                hit.set_child_docs(child_docs);
                self.aggregator.populate_children(
                    &mut hit,
                    self.config.child_hits_initial_load,
                    0,
                    locale,
                )?;
            }
            hits.push(hit);
        }
        Ok(hits)
    }
}
