//! The result of one search execution.

use serde::Serialize;

use crate::hit::aggregator::SearchHit;
use crate::query::sort::SortField;
use crate::query::terms::SearchTerms;

/// Number of the last result page.
///
/// Zero hits still have one (empty) page. A page size of zero is treated as a
/// single page.
pub fn last_page(hits_count: u64, hits_per_page: usize) -> usize {
    if hits_per_page == 0 {
        return 1;
    }
    let per_page = hits_per_page as u64;
    let pages = hits_count.div_ceil(per_page);
    usize::try_from(pages).unwrap_or(usize::MAX).max(1)
}

/// Hits and paging state produced by
/// [`SearchOrchestrator::execute`](crate::search::SearchOrchestrator::execute).
///
/// Rebuilt on every execution and never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchExecution {
    /// Query sent to the index service.
    pub final_query: String,
    /// Child document query of aggregated searches.
    pub expand_query: Option<String>,
    pub sort_fields: Vec<SortField>,
    /// Current page, starting at 1.
    pub page: usize,
    pub hits_per_page: usize,
    pub hits_count: u64,
    pub hits: Vec<SearchHit>,
    /// Terms used for highlighting.
    pub search_terms: SearchTerms,
    pub aggregated: bool,
}

impl SearchExecution {
    pub fn last_page(&self) -> usize {
        last_page(self.hits_count, self.hits_per_page)
    }

    /// Clamp a requested page into `[1, last_page]`.
    pub fn clamp_page(&self, requested: usize) -> usize {
        requested.clamp(1, self.last_page())
    }

    /// Offset of the first hit of the current page.
    pub fn first_hit_index(&self) -> usize {
        self.page.saturating_sub(1) * self.hits_per_page
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.last_page()
    }
}
