//! Term browsing: distinct values of a field over a document set with the
//! number of documents carrying each value.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::document::IndexDocument;
use crate::util::normalize::strip_diacritics;

/// One distinct value of the browsed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseTerm {
    pub term: String,
    /// Value the term is ordered by.
    pub sort_term: String,
    /// Number of documents carrying the term.
    pub hit_count: u64,
}

#[derive(Debug)]
struct TermEntry {
    sort_term: String,
    count: AtomicU64,
}

/// Collects browse terms from documents in parallel.
///
/// Terms are stored in a shared map. The write lock is only taken when a term
/// is seen for the first time; later occurrences increment an atomic counter
/// under the read lock.
#[derive(Debug)]
pub struct TermCollector {
    field: String,
    sort_field: Option<String>,
    /// Only terms starting with this prefix (ignoring case and diacritics).
    prefix: Option<String>,
    terms: RwLock<AHashMap<String, Arc<TermEntry>>>,
    processed: AtomicUsize,
    total: AtomicUsize,
}

fn sort_key(value: &str) -> String {
    strip_diacritics(value.trim()).to_lowercase()
}

impl TermCollector {
    pub fn new<S: Into<String>>(field: S) -> Self {
        TermCollector {
            field: field.into(),
            sort_field: None,
            prefix: None,
            terms: RwLock::new(AHashMap::new()),
            processed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Order terms by the values of a parallel sort field (e.g. `SORT_X`).
    pub fn sort_field<S: Into<String>>(mut self, field: S) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        let prefix = sort_key(prefix.as_ref());
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Add the terms of `docs` and return all terms collected so far.
    pub fn collect(&self, docs: &[IndexDocument]) -> Vec<BrowseTerm> {
        self.total.fetch_add(docs.len(), Ordering::Relaxed);
        docs.par_iter().for_each(|doc| {
            self.process(doc);
            self.processed.fetch_add(1, Ordering::Relaxed);
        });
        debug!(field = %self.field, docs = docs.len(), "collected browse terms");
        self.terms()
    }

    /// Fraction of documents processed; only an approximation while a
    /// collection is running.
    pub fn progress(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 1.0;
        }
        self.processed.load(Ordering::Relaxed) as f64 / total as f64
    }

    fn process(&self, doc: &IndexDocument) {
        let values = doc.values(&self.field);
        let sort_values = self
            .sort_field
            .as_deref()
            .map(|field| doc.values(field))
            .unwrap_or_default();

        let mut seen = AHashSet::new();
        for (i, value) in values.iter().enumerate() {
            let term = value.trim();
            if term.is_empty() || !seen.insert(term) {
                continue;
            }
            let sort_term = sort_values
                .get(i)
                .map(|s| sort_key(s))
                .unwrap_or_else(|| sort_key(term));
            if let Some(prefix) = &self.prefix {
                if !sort_key(term).starts_with(prefix.as_str()) {
                    continue;
                }
            }
            self.entry(term, sort_term).count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn entry(&self, term: &str, sort_term: String) -> Arc<TermEntry> {
        if let Some(entry) = self.terms.read().get(term) {
            return entry.clone();
        }
        self.terms
            .write()
            .entry(term.to_string())
            .or_insert_with(|| {
                Arc::new(TermEntry {
                    sort_term,
                    count: AtomicU64::new(0),
                })
            })
            .clone()
    }

    /// All collected terms ordered by sort term, then term.
    pub fn terms(&self) -> Vec<BrowseTerm> {
        let mut terms: Vec<BrowseTerm> = self
            .terms
            .read()
            .iter()
            .map(|(term, entry)| BrowseTerm {
                term: term.clone(),
                sort_term: entry.sort_term.clone(),
                hit_count: entry.count.load(Ordering::Relaxed),
            })
            .collect();
        terms.sort_by(|a, b| match a.sort_term.cmp(&b.sort_term) {
            CmpOrdering::Equal => a.term.cmp(&b.term),
            other => other,
        });
        terms
    }
}
