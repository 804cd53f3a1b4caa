//! Assembly of search hits and their child hit trees.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::{Result, VellumError};
use crate::highlight::{HighlightConfig, truncate_fulltext};
use crate::hit::browse_element::BrowseElement;
use crate::hit::found_metadata::{
    ConfigTranslator, FoundMetadataContext, Translator, populate_found_metadata,
};
use crate::hit::types::HitType;
use crate::index::document::{DocType, IndexDocument};
use crate::index::fields;
use crate::index::service::{FulltextLoader, IndexService, StoredFulltext};
use crate::query::terms::SearchTerms;

/// One entry of a result list, possibly with nested child hits.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub hit_type: HitType,
    pub browse_element: BrowseElement,
    pub children: Vec<SearchHit>,
    /// Number of realized children per hit type.
    pub hit_type_counts: BTreeMap<HitType, usize>,
    /// Matching document values not shown in the label.
    pub found_metadata: Vec<(String, String)>,
    #[serde(skip)]
    doc: IndexDocument,
    #[serde(skip)]
    child_docs: Vec<IndexDocument>,
    #[serde(skip)]
    hits_populated: usize,
    #[serde(skip)]
    search_terms: SearchTerms,
}

impl SearchHit {
    /// The document this hit was built from.
    pub fn document(&self) -> &IndexDocument {
        &self.doc
    }

    pub fn search_terms(&self) -> &SearchTerms {
        &self.search_terms
    }

    /// Attach the child documents of an aggregated hit. Resets population.
    pub fn set_child_docs(&mut self, child_docs: Vec<IndexDocument>) {
        self.child_docs = child_docs;
        self.hits_populated = 0;
        self.children.clear();
        self.hit_type_counts.clear();
    }

    pub fn child_docs(&self) -> &[IndexDocument] {
        &self.child_docs
    }

    /// Number of child documents processed so far.
    pub fn hits_populated(&self) -> usize {
        self.hits_populated
    }

    /// Child documents not yet turned into hits.
    pub fn child_docs_remaining(&self) -> usize {
        self.child_docs.len().saturating_sub(self.hits_populated)
    }

    pub fn has_more_children(&self) -> bool {
        self.hits_populated < self.child_docs.len()
    }

    /// Total number of realized children over all types.
    pub fn child_count(&self) -> usize {
        self.hit_type_counts.values().sum()
    }
}

/// Documents and owner hits known while one hit's children are populated.
///
/// Lives only for a single [`HitAggregator::populate_children`] call.
struct ChildBuildContext {
    owner_docs: HashMap<String, IndexDocument>,
    /// Owner IDDOC to the position of its hit in the top hit's children.
    owner_hits: HashMap<String, usize>,
}

impl ChildBuildContext {
    fn new(hit: &SearchHit) -> Self {
        let mut owner_docs = HashMap::new();
        let mut owner_hits = HashMap::new();
        for (i, child) in hit.children.iter().enumerate() {
            if child.hit_type != HitType::Docstrct {
                continue;
            }
            if let Some(iddoc) = child.doc.iddoc() {
                owner_hits.insert(iddoc.to_string(), i);
                owner_docs.insert(iddoc.to_string(), child.doc.clone());
            }
        }
        ChildBuildContext {
            owner_docs,
            owner_hits,
        }
    }
}

/// Where a child hit ends up in the tree.
#[derive(Clone, Copy)]
enum Placement {
    Top,
    Owner(usize),
}

/// Builds [`SearchHit`]s from index documents.
pub struct HitAggregator {
    config: Arc<SearchConfig>,
    highlight: HighlightConfig,
    index: Arc<dyn IndexService>,
    fulltext: Arc<dyn FulltextLoader>,
    translator: Arc<dyn Translator>,
}

impl HitAggregator {
    /// Create an aggregator reading full texts from the index documents and
    /// translating labels from the configuration.
    pub fn new(config: Arc<SearchConfig>, index: Arc<dyn IndexService>) -> Self {
        HitAggregator {
            highlight: HighlightConfig::from_search_config(&config),
            translator: Arc::new(ConfigTranslator::from_config(&config)),
            fulltext: Arc::new(StoredFulltext),
            config,
            index,
        }
    }

    pub fn with_fulltext_loader(mut self, loader: Arc<dyn FulltextLoader>) -> Self {
        self.fulltext = loader;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn highlight(&self) -> &HighlightConfig {
        &self.highlight
    }

    /// Build a hit for `doc`.
    ///
    /// `hierarchy` lists the structure elements above the document, root
    /// first. A full text is cut into a highlighted snippet. Values already reported in
    /// `owner_found` are left out of the found metadata.
    ///
    /// Fails with [`VellumError::DataIntegrity`] if the document type is
    /// unknown.
    pub fn create_search_hit(
        &self,
        doc: IndexDocument,
        hierarchy: &[&IndexDocument],
        locale: &str,
        fulltext: Option<&str>,
        terms: &SearchTerms,
        owner_found: &[(String, String)],
    ) -> Result<SearchHit> {
        let hit_type = HitType::of_document(&doc).ok_or_else(|| {
            VellumError::data_integrity(format!(
                "document {} has no known {}",
                doc.iddoc().unwrap_or("?"),
                fields::DOCTYPE
            ))
        })?;

        let mut browse_element = BrowseElement::new(
            &doc,
            hierarchy,
            locale,
            &terms.all_terms(),
            &self.config,
            &self.highlight,
            false,
        );

        if let Some(text) = fulltext {
            let snippet = truncate_fulltext(
                &self.highlight,
                &terms.terms_for_field(fields::FULLTEXT),
                text,
                self.highlight.fragment_length,
                true,
                true,
            )
            .into_iter()
            .next()
            .map(|fragment| self.highlight.replace_markers(&fragment));
            browse_element.set_fulltext(snippet);
        }

        let ctx = FoundMetadataContext {
            config: &self.config,
            highlight: &self.highlight,
            translator: self.translator.as_ref(),
            locale,
        };
        let found_metadata =
            populate_found_metadata(&ctx, &doc, terms, &browse_element.label, owner_found);

        Ok(SearchHit {
            hit_type,
            browse_element,
            children: Vec::new(),
            hit_type_counts: BTreeMap::new(),
            found_metadata,
            doc,
            child_docs: Vec::new(),
            hits_populated: 0,
            search_terms: terms.clone(),
        })
    }

    /// Build a hit for a document of a result page.
    ///
    /// Pages get a snippet of their full text. Pages the user may not read
    /// become access-denied placeholders.
    pub fn create_result_hit(
        &self,
        doc: IndexDocument,
        locale: &str,
        terms: &SearchTerms,
    ) -> Result<SearchHit> {
        let fulltext = if doc.doc_type() == Some(DocType::Page) {
            match self.fulltext.load_fulltext(&doc) {
                Ok(text) => text,
                Err(VellumError::AccessDenied(_)) => {
                    return Ok(self.access_denied_hit(doc, &[], locale));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        iddoc = doc.iddoc().unwrap_or_default(),
                        error = %e,
                        "could not load full text"
                    );
                    None
                }
            }
        } else {
            None
        };
        self.create_search_hit(doc, &[], locale, fulltext.as_deref(), terms, &[])
    }

    /// Placeholder for a child whose content the user may not see.
    fn access_denied_hit(
        &self,
        doc: IndexDocument,
        hierarchy: &[&IndexDocument],
        locale: &str,
    ) -> SearchHit {
        let browse_element =
            BrowseElement::new(&doc, hierarchy, locale, &[], &self.config, &self.highlight, true);
        SearchHit {
            hit_type: HitType::AccessDenied,
            browse_element,
            children: Vec::new(),
            hit_type_counts: BTreeMap::new(),
            found_metadata: Vec::new(),
            doc,
            child_docs: Vec::new(),
            hits_populated: 0,
            search_terms: SearchTerms::new(),
        }
    }

    /// Turn up to `n` child documents, starting at `skip`, into child hits.
    ///
    /// Structure elements become direct children of `hit`. Pages, metadata,
    /// user content and events are placed under the hit of their owner
    /// structure element, which is fetched from the index on first
    /// reference. Children keep the order of the child documents.
    pub fn populate_children(
        &self,
        hit: &mut SearchHit,
        n: usize,
        skip: usize,
        locale: &str,
    ) -> Result<()> {
        let end = skip.saturating_add(n).min(hit.child_docs.len());
        if skip >= end {
            return Ok(());
        }
        debug!(
            iddoc = hit.doc.iddoc().unwrap_or_default(),
            skip,
            end,
            "populating child hits"
        );

        let mut ctx = ChildBuildContext::new(hit);
        let top_iddoc = hit.doc.iddoc().map(str::to_string);
        let terms = hit.search_terms.clone();
        let docs: Vec<IndexDocument> = hit.child_docs[skip..end].to_vec();

        for child in docs {
            let Some(child_type) = HitType::of_document(&child) else {
                warn!(
                    iddoc = child.iddoc().unwrap_or_default(),
                    "child document without {}, skipping",
                    fields::DOCTYPE
                );
                continue;
            };

            if child_type == HitType::Docstrct {
                if self.add_docstrct_child(hit, &mut ctx, child, locale, &terms) {
                    *hit.hit_type_counts.entry(HitType::Docstrct).or_default() += 1;
                }
                continue;
            }

            let placement = match child.first(fields::IDDOC_OWNER) {
                Some(owner) if Some(owner) != top_iddoc.as_deref() => {
                    match self.owner_hit(hit, &mut ctx, owner, locale, &terms) {
                        Ok(placement) => placement,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => {
                            warn!(owner, error = %e, "owner lookup failed, skipping child");
                            continue;
                        }
                    }
                }
                _ => Placement::Top,
            };

            let (ancestors, owner_found) = match placement {
                Placement::Top => (vec![hit.doc.clone()], hit.found_metadata.clone()),
                Placement::Owner(i) => (
                    vec![hit.doc.clone(), hit.children[i].doc.clone()],
                    hit.children[i].found_metadata.clone(),
                ),
            };
            let hierarchy: Vec<&IndexDocument> = ancestors.iter().collect();

            let child_hit = if child_type == HitType::Page {
                match self.fulltext.load_fulltext(&child) {
                    Ok(Some(text)) => self.create_search_hit(
                        child,
                        &hierarchy,
                        locale,
                        Some(&text),
                        &terms,
                        &owner_found,
                    ),
                    Ok(None) => {
                        debug!(
                            iddoc = child.iddoc().unwrap_or_default(),
                            "page without full text, skipping"
                        );
                        continue;
                    }
                    Err(VellumError::AccessDenied(_)) => {
                        Ok(self.access_denied_hit(child, &hierarchy, locale))
                    }
                    Err(e) => {
                        warn!(
                            iddoc = child.iddoc().unwrap_or_default(),
                            error = %e,
                            "could not load full text, skipping page"
                        );
                        continue;
                    }
                }
            } else {
                self.create_search_hit(child, &hierarchy, locale, None, &terms, &owner_found)
            };

            match child_hit {
                Ok(child_hit) => {
                    *hit.hit_type_counts.entry(child_hit.hit_type).or_default() += 1;
                    match placement {
                        Placement::Top => hit.children.push(child_hit),
                        Placement::Owner(i) => hit.children[i].children.push(child_hit),
                    }
                }
                Err(e) => warn!(error = %e, "skipping child hit"),
            }
        }

        hit.hits_populated = hit.hits_populated.max(end);
        Ok(())
    }

    /// Add a structure element as a direct child of `hit`.
    ///
    /// Returns whether a child hit was added.
    fn add_docstrct_child(
        &self,
        hit: &mut SearchHit,
        ctx: &mut ChildBuildContext,
        child: IndexDocument,
        locale: &str,
        terms: &SearchTerms,
    ) -> bool {
        let Some(iddoc) = child.iddoc().map(str::to_string) else {
            warn!("structure element without {}, skipping", fields::IDDOC);
            return false;
        };
        if ctx.owner_hits.contains_key(&iddoc) {
            return false;
        }
        let owner_found = hit.found_metadata.clone();
        match self.create_search_hit(child.clone(), &[&hit.doc], locale, None, terms, &owner_found) {
            Ok(child_hit) => {
                ctx.owner_hits.insert(iddoc.clone(), hit.children.len());
                ctx.owner_docs.insert(iddoc, child);
                hit.children.push(child_hit);
                true
            }
            Err(e) => {
                warn!(iddoc, error = %e, "skipping structure element");
                false
            }
        }
    }

    /// Find or create the hit of the owner structure element `owner`.
    fn owner_hit(
        &self,
        hit: &mut SearchHit,
        ctx: &mut ChildBuildContext,
        owner: &str,
        locale: &str,
        terms: &SearchTerms,
    ) -> Result<Placement> {
        if let Some(&i) = ctx.owner_hits.get(owner) {
            return Ok(Placement::Owner(i));
        }

        let owner_doc = match ctx.owner_docs.get(owner) {
            Some(doc) => doc.clone(),
            None => {
                let doc = self.index.document_by_iddoc(owner)?.ok_or_else(|| {
                    VellumError::data_integrity(format!("owner document {owner} not found"))
                })?;
                ctx.owner_docs.insert(owner.to_string(), doc.clone());
                doc
            }
        };

        let owner_found = hit.found_metadata.clone();
        let owner_hit =
            self.create_search_hit(owner_doc, &[&hit.doc], locale, None, terms, &owner_found)?;
        let i = hit.children.len();
        hit.children.push(owner_hit);
        ctx.owner_hits.insert(owner.to_string(), i);
        Ok(Placement::Owner(i))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::index::service::{IndexRequest, IndexResponse};
    use crate::query::terms::extract_search_terms;

    struct OwnerIndex {
        owners: Vec<IndexDocument>,
        lookups: AtomicUsize,
    }

    impl IndexService for OwnerIndex {
        fn search(&self, _request: &IndexRequest) -> Result<IndexResponse> {
            Ok(IndexResponse::default())
        }

        fn document_by_iddoc(&self, iddoc: &str) -> Result<Option<IndexDocument>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.owners.iter().find(|d| d.iddoc() == Some(iddoc)).cloned())
        }
    }

    struct DenyAll;

    impl FulltextLoader for DenyAll {
        fn load_fulltext(&self, _page: &IndexDocument) -> Result<Option<String>> {
            Err(VellumError::access_denied("fulltext"))
        }
    }

    fn record() -> IndexDocument {
        IndexDocument::builder()
            .field(fields::IDDOC, "1")
            .field(fields::PI, "PPN1")
            .doc_type(DocType::Docstrct)
            .field(fields::DOCSTRCT, "monograph")
            .field(fields::LABEL, "Birds of the north")
            .build()
    }

    fn chapter() -> IndexDocument {
        IndexDocument::builder()
            .field(fields::IDDOC, "10")
            .field(fields::PI_TOPSTRUCT, "PPN1")
            .doc_type(DocType::Docstrct)
            .field(fields::DOCSTRCT, "chapter")
            .field(fields::LABEL, "Chapter 1")
            .build()
    }

    fn page(iddoc: &str, owner: &str, text: &str) -> IndexDocument {
        IndexDocument::builder()
            .field(fields::IDDOC, iddoc)
            .field(fields::IDDOC_OWNER, owner)
            .field(fields::PI_TOPSTRUCT, "PPN1")
            .doc_type(DocType::Page)
            .field(fields::ORDER, "1")
            .field(fields::FULLTEXT, text)
            .build()
    }

    fn aggregator(owners: Vec<IndexDocument>) -> (HitAggregator, Arc<OwnerIndex>) {
        let config = Arc::new(SearchConfig::builder().highlight_markup("<b>", "</b>").build());
        let index = Arc::new(OwnerIndex {
            owners,
            lookups: AtomicUsize::new(0),
        });
        (HitAggregator::new(config, index.clone()), index)
    }

    #[test]
    fn test_page_child_snippet() {
        let (aggregator, _) = aggregator(vec![]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        assert_eq!(hit.hit_type, HitType::Docstrct);
        assert_eq!(hit.browse_element.label_highlighted, "<b>Bird</b>s of the north");

        hit.set_child_docs(vec![page("2", "1", "A small bird sits on the fence.")]);
        assert!(hit.has_more_children());
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();

        assert!(!hit.has_more_children());
        assert_eq!(hit.hit_type_counts.get(&HitType::Page), Some(&1));
        assert_eq!(hit.children.len(), 1);
        let snippet = hit.children[0].browse_element.fulltext.as_deref().unwrap();
        assert!(snippet.contains("<b>bird</b>"), "{snippet}");
    }

    #[test]
    fn test_children_grouped_under_owner() {
        let (aggregator, index) = aggregator(vec![chapter()]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        hit.set_child_docs(vec![
            page("11", "10", "bird one"),
            page("12", "10", "bird two"),
            page("13", "1", "bird three"),
        ]);

        aggregator.populate_children(&mut hit, 2, 0, "en").unwrap();
        assert_eq!(index.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(hit.children.len(), 1);
        assert_eq!(hit.children[0].hit_type, HitType::Docstrct);
        assert_eq!(hit.children[0].children.len(), 2);
        assert_eq!(hit.hits_populated(), 2);
        assert_eq!(hit.child_docs_remaining(), 1);

        aggregator.populate_children(&mut hit, 2, 2, "en").unwrap();
        assert_eq!(hit.children.len(), 2);
        assert_eq!(hit.children[1].hit_type, HitType::Page);
        assert_eq!(hit.hit_type_counts.get(&HitType::Page), Some(&3));
        assert_eq!(hit.child_count(), 3);
        assert!(!hit.has_more_children());
    }

    #[test]
    fn test_nested_docstrct_is_direct_child() {
        let (aggregator, index) = aggregator(vec![]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        hit.set_child_docs(vec![chapter(), page("11", "10", "bird")]);
        aggregator.populate_children(&mut hit, 10, 0, "en").unwrap();

        assert_eq!(index.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(hit.children.len(), 1);
        assert_eq!(hit.children[0].children.len(), 1);
        assert_eq!(hit.hit_type_counts.get(&HitType::Docstrct), Some(&1));
        assert_eq!(hit.hit_type_counts.get(&HitType::Page), Some(&1));
    }

    #[test]
    fn test_grouped_page_keeps_full_hierarchy() {
        let (aggregator, _) = aggregator(vec![chapter()]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        hit.set_child_docs(vec![page("11", "10", "bird")]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();

        let chapter_hit = &hit.children[0];
        let labels: Vec<&str> = chapter_hit
            .browse_element
            .structure_elements
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Birds of the north", "Chapter 1"]);

        let page_hit = &chapter_hit.children[0];
        let labels: Vec<&str> = page_hit
            .browse_element
            .structure_elements
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Birds of the north", "Chapter 1"]);
    }

    #[test]
    fn test_docstrct_count_matches_added_children() {
        let (aggregator, _) = aggregator(vec![]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        let no_iddoc = IndexDocument::builder()
            .field(fields::PI_TOPSTRUCT, "PPN1")
            .doc_type(DocType::Docstrct)
            .field(fields::LABEL, "Loose chapter")
            .build();
        hit.set_child_docs(vec![no_iddoc]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();
        assert!(hit.children.is_empty());
        assert_eq!(hit.hit_type_counts.get(&HitType::Docstrct), None);

        hit.set_child_docs(vec![chapter(), chapter()]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();
        assert_eq!(hit.children.len(), 1);
        assert_eq!(hit.hit_type_counts.get(&HitType::Docstrct), Some(&1));
    }

    #[test]
    fn test_page_without_text_and_denied_pages() {
        let (aggregator, _) = aggregator(vec![]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        hit.set_child_docs(vec![page("2", "1", " ")]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();
        assert!(hit.children.is_empty());
        assert_eq!(hit.hits_populated(), 1);

        let aggregator = aggregator.with_fulltext_loader(Arc::new(DenyAll));
        hit.set_child_docs(vec![page("2", "1", "bird")]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();
        assert_eq!(hit.children.len(), 1);
        assert_eq!(hit.children[0].hit_type, HitType::AccessDenied);
        assert!(hit.children[0].browse_element.thumbnail_url.is_none());
        assert_eq!(hit.hit_type_counts.get(&HitType::AccessDenied), Some(&1));
    }

    #[test]
    fn test_missing_owner_is_skipped() {
        let (aggregator, _) = aggregator(vec![]);
        let terms = extract_search_terms("bird").unwrap();
        let mut hit = aggregator
            .create_search_hit(record(), &[], "en", None, &terms, &[])
            .unwrap();
        hit.set_child_docs(vec![page("2", "99", "bird"), IndexDocument::new()]);
        aggregator.populate_children(&mut hit, 5, 0, "en").unwrap();
        assert!(hit.children.is_empty());
        assert_eq!(hit.hits_populated(), 2);
    }

    #[test]
    fn test_unknown_doctype() {
        let (aggregator, _) = aggregator(vec![]);
        let error = aggregator
            .create_search_hit(IndexDocument::new(), &[], "en", None, &SearchTerms::new(), &[])
            .unwrap_err();
        assert!(!error.is_fatal());
    }
}
