//! Result store
//!
//! Owns the last fetched provider list, the criteria that produced it and
//! the user's filter state for one results view. Every mutation is mirrored
//! to the durable session store through the persistence bridge.

use crate::filtering::{self, BooleanFacet, FilterState, MultiFacet, SortKey};
use crate::orchestrator::RequestMode;
use crate::provider::{ClinicalProfile, Provider, ProviderLinks, SearchCriteria};
use crate::ranking::RankingSource;
use crate::session::{PersistedSession, PersistenceBridge};
use crate::view::{rank_entries, Pagination, RankedEntry, ResultPage};
use chrono::Utc;
use uuid::Uuid;

/// Everything a completed fetch hands to the store
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedResults {
    pub criteria: SearchCriteria,
    /// Ranked (or fallback-ordered) provider list
    pub providers: Vec<Provider>,
    pub links: ProviderLinks,
    pub profile: ClinicalProfile,
    pub ranking: RankingSource,
    pub mode: RequestMode,
    pub run_id: Option<Uuid>,
}

impl FetchedResults {
    pub fn new(criteria: SearchCriteria, providers: Vec<Provider>, links: ProviderLinks) -> Self {
        Self {
            criteria,
            providers,
            links,
            profile: ClinicalProfile::default(),
            ranking: RankingSource::External,
            mode: RequestMode::Full,
            run_id: None,
        }
    }

    pub fn with_profile(mut self, profile: ClinicalProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_ranking(mut self, ranking: RankingSource) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

/// Single-owner store behind one results view
pub struct ResultStore {
    bridge: PersistenceBridge,
    default_page_size: usize,
    run_id: Option<Uuid>,
    criteria: Option<SearchCriteria>,
    raw: Vec<Provider>,
    links: ProviderLinks,
    profile: ClinicalProfile,
    ranking: RankingSource,
    mode: RequestMode,
    filter: FilterState,
}

impl ResultStore {
    pub fn new(bridge: PersistenceBridge, default_page_size: usize) -> Self {
        let default_page_size = default_page_size.max(1);
        Self {
            bridge,
            default_page_size,
            run_id: None,
            criteria: None,
            raw: Vec::new(),
            links: ProviderLinks::new(),
            profile: ClinicalProfile::default(),
            ranking: RankingSource::External,
            mode: RequestMode::Full,
            filter: FilterState::with_page_size(default_page_size),
        }
    }

    /// Replace the result set, reset the filter state and persist
    pub fn set_results(&mut self, results: FetchedResults) {
        tracing::debug!(
            "Storing {} providers for {}",
            results.providers.len(),
            results.criteria.label()
        );

        self.run_id = results.run_id;
        self.criteria = Some(results.criteria);
        self.raw = results.providers;
        self.links = results.links;
        self.profile = results.profile;
        self.ranking = results.ranking;
        self.mode = results.mode;
        self.filter = FilterState::with_page_size(self.default_page_size);
        self.persist();
    }

    /// Store an assessment-only outcome: a profile and no providers yet
    pub fn set_assessment(
        &mut self,
        criteria: SearchCriteria,
        profile: ClinicalProfile,
        run_id: Option<Uuid>,
    ) {
        self.set_results(FetchedResults {
            criteria,
            providers: Vec::new(),
            links: ProviderLinks::new(),
            profile,
            ranking: RankingSource::External,
            mode: RequestMode::AssessmentOnly,
            run_id,
        });
    }

    /// Adopt a persisted session verbatim, filter state included
    ///
    /// Does not write back: the durable copy already matches.
    pub fn restore(&mut self, session: PersistedSession) {
        tracing::debug!(
            "Restoring {} providers from saved session ({})",
            session.providers.len(),
            session.saved_at
        );

        self.run_id = session.run_id;
        self.criteria = session.criteria;
        self.raw = session.providers;
        self.links = session.links;
        self.profile = session.profile;
        self.ranking = session.ranking;
        self.mode = session.mode;
        self.filter = session.filter;
    }

    /// Projection written to the durable store
    pub fn snapshot(&self) -> PersistedSession {
        PersistedSession {
            version: crate::session::SESSION_VERSION,
            saved_at: Utc::now(),
            run_id: self.run_id,
            criteria: self.criteria.clone(),
            providers: self.raw.clone(),
            links: self.links.clone(),
            filter: self.filter.clone(),
            profile: self.profile.clone(),
            ranking: self.ranking,
            mode: self.mode,
        }
    }

    fn persist(&self) {
        if let Err(e) = self.bridge.persist(&self.snapshot()) {
            tracing::warn!("Failed to persist result session: {}", e);
        }
    }

    pub fn bridge(&self) -> &PersistenceBridge {
        &self.bridge
    }

    // ----- reads -----

    /// Unfiltered provider list in ranked order
    pub fn raw(&self) -> &[Provider] {
        &self.raw
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    pub fn links(&self) -> &ProviderLinks {
        &self.links
    }

    pub fn profile(&self) -> &ClinicalProfile {
        &self.profile
    }

    pub fn ranking(&self) -> RankingSource {
        self.ranking
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Providers passing the current filter, in display order
    pub fn filtered(&self) -> Vec<&Provider> {
        filtering::apply(&self.raw, &self.filter)
    }

    /// Ranked and graded view of the filtered providers
    pub fn ranked(&self) -> Vec<RankedEntry<'_>> {
        rank_entries(&self.filtered(), &self.links)
    }

    pub fn pagination(&self) -> Pagination {
        let matches = self.filtered().len();
        Pagination::new(matches, self.filter.page_size, self.filter.page)
    }

    /// The visible page
    pub fn page(&self) -> ResultPage<'_> {
        let ranked = self.ranked();
        let pagination = Pagination::new(ranked.len(), self.filter.page_size, self.filter.page);
        ResultPage::build(ranked, pagination, self.raw.len(), self.ranking)
    }

    /// Values to offer for a multi-select facet
    pub fn facet_values(&self, facet: MultiFacet) -> Vec<(String, usize)> {
        filtering::facet_values(&self.raw, facet)
    }

    // ----- filter mutations -----

    /// Change the filtered set: apply `change`, return to page 1, persist
    fn refilter(&mut self, change: impl FnOnce(&mut FilterState)) {
        change(&mut self.filter);
        self.filter.page = 1;
        self.persist();
    }

    pub fn set_term(&mut self, term: &str) {
        let term = term.to_string();
        self.refilter(|f| f.term = term);
    }

    pub fn set_boolean_facet(&mut self, facet: BooleanFacet, required: Option<bool>) {
        self.refilter(|f| f.set_requirement(facet, required));
    }

    /// Toggle one multi-select value; returns whether it is now selected
    pub fn toggle_facet_value(&mut self, facet: MultiFacet, value: &str) -> bool {
        let mut selected = false;
        self.refilter(|f| selected = f.toggle(facet, value));
        selected
    }

    pub fn clear_facet(&mut self, facet: MultiFacet) {
        self.refilter(|f| f.selected_mut(facet).clear());
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.refilter(|f| f.sort = sort);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.refilter(|f| f.page_size = page_size.max(1));
    }

    /// Clear search term, facets and sort; keeps the page size
    pub fn reset_filters(&mut self) {
        let page_size = self.filter.page_size;
        self.refilter(|f| *f = FilterState::with_page_size(page_size));
    }

    // ----- pagination -----

    fn move_page(&mut self, step: impl FnOnce(&mut Pagination)) {
        let mut pagination = self.pagination();
        step(&mut pagination);
        self.filter.page = pagination.page();
        self.persist();
    }

    pub fn next_page(&mut self) {
        self.move_page(|p| p.next());
    }

    pub fn previous_page(&mut self) {
        self.move_page(|p| p.previous());
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.move_page(|p| p.go_to(page));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::provider;
    use crate::ranking::Grade;
    use crate::storage::MemorySessionStore;
    use std::sync::Arc;

    fn store_with(memory: &MemorySessionStore) -> ResultStore {
        ResultStore::new(PersistenceBridge::new(Arc::new(memory.clone())), 10)
    }

    fn providers(n: usize) -> Vec<Provider> {
        (1..=n)
            .map(|i| {
                let mut p = provider(&i.to_string(), &format!("Dr. {}", i), "Cardiology", "Ely");
                p.board_certified = i % 2 == 0;
                p
            })
            .collect()
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::new("MN", "Ely", "palpitations")
    }

    #[test]
    fn test_set_results_resets_filter_and_persists() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);

        store.set_results(FetchedResults::new(criteria(), providers(3), ProviderLinks::new()));
        store.set_term("dr. 2");
        assert_eq!(store.filtered().len(), 1);

        store.set_results(FetchedResults::new(criteria(), providers(5), ProviderLinks::new()));
        assert_eq!(store.filter(), &FilterState::with_page_size(10));
        assert_eq!(store.raw().len(), 5);

        let saved = store.bridge().restore().unwrap();
        assert_eq!(saved.providers.len(), 5);
        assert_eq!(saved.filter, FilterState::with_page_size(10));
    }

    #[test]
    fn test_every_filter_mutation_persists() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);
        store.set_results(FetchedResults::new(criteria(), providers(4), ProviderLinks::new()));

        store.set_boolean_facet(BooleanFacet::BoardCertified, Some(true));
        assert_eq!(
            store.bridge().restore().unwrap().filter.board_certified,
            Some(true)
        );

        store.set_sort(SortKey::Name);
        assert_eq!(store.bridge().restore().unwrap().filter.sort, SortKey::Name);

        store.toggle_facet_value(MultiFacet::Language, "French");
        assert!(store
            .bridge()
            .restore()
            .unwrap()
            .filter
            .languages
            .contains("French"));
    }

    #[test]
    fn test_filtering_changes_grades() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);
        store.set_results(FetchedResults::new(criteria(), providers(4), ProviderLinks::new()));

        let ranked = store.ranked();
        let fourth = ranked.iter().find(|e| e.provider.registry_number == "4").unwrap();
        assert_eq!(fourth.rank, 4);
        assert_eq!(fourth.grade, Grade::F);

        store.set_boolean_facet(BooleanFacet::BoardCertified, Some(true));
        let ranked = store.ranked();
        let fourth = ranked.iter().find(|e| e.provider.registry_number == "4").unwrap();
        assert_eq!(fourth.rank, 2);
    }

    #[test]
    fn test_pagination_and_reset_to_first_page() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);
        store.set_results(FetchedResults::new(criteria(), providers(23), ProviderLinks::new()));

        store.next_page();
        store.next_page();
        store.next_page();
        assert_eq!(store.page().page, 3);
        assert_eq!(store.page().entries.len(), 3);

        store.set_page_size(5);
        assert_eq!(store.filter().page, 1);
        assert_eq!(store.page().total_pages, 5);

        store.go_to_page(5);
        store.set_term("dr.");
        assert_eq!(store.filter().page, 1);

        store.previous_page();
        assert_eq!(store.filter().page, 1);
    }

    #[test]
    fn test_reset_filters_keeps_page_size() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);
        store.set_results(FetchedResults::new(criteria(), providers(3), ProviderLinks::new()));

        store.set_page_size(2);
        store.set_term("x");
        store.reset_filters();

        assert_eq!(store.filter(), &FilterState::with_page_size(2));
    }

    #[test]
    fn test_assessment_only_has_no_providers() {
        let memory = MemorySessionStore::new();
        let mut store = store_with(&memory);
        store.set_assessment(criteria(), ClinicalProfile::default(), None);

        assert!(store.is_empty());
        assert_eq!(store.mode(), RequestMode::AssessmentOnly);
        assert_eq!(store.page().total_pages, 0);
        assert_eq!(store.page().page, 1);
    }
}
