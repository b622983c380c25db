//! Derived result views: ranked entries and the visible page
//!
//! Nothing here is stored. Rank and grade are recomputed from the filtered
//! sequence every time, so narrowing the filter changes them.

mod pagination;

pub use pagination::{page_bounds, total_pages, Pagination};

use crate::provider::{Provider, ProviderLinks, SupplementalLink};
use crate::ranking::{grade, Grade, RankingSource};
use serde::Serialize;

/// One provider in a ranked result set
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry<'a> {
    /// 1-based position in the filtered sequence
    pub rank: usize,
    pub grade: Grade,
    pub provider: &'a Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<&'a [SupplementalLink]>,
}

/// Rank and grade every provider in `filtered`
pub fn rank_entries<'a>(
    filtered: &[&'a Provider],
    links: &'a ProviderLinks,
) -> Vec<RankedEntry<'a>> {
    let total = filtered.len();
    filtered
        .iter()
        .enumerate()
        .map(|(position, &provider)| RankedEntry {
            rank: position + 1,
            grade: grade(position + 1, total),
            provider,
            links: links.get(&provider.name),
        })
        .collect()
}

/// The visible slice of a ranked result set
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage<'a> {
    pub entries: Vec<RankedEntry<'a>>,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    /// Providers matching the current filter
    pub total_matches: usize,
    /// Providers in the unfiltered result
    pub total_results: usize,
    pub ranking: RankingSource,
}

impl<'a> ResultPage<'a> {
    /// Slice `ranked` according to `pagination`
    pub fn build(
        mut ranked: Vec<RankedEntry<'a>>,
        pagination: Pagination,
        total_results: usize,
        ranking: RankingSource,
    ) -> Self {
        let total_matches = ranked.len();
        let bounds = pagination.bounds();
        ranked.truncate(bounds.end);
        let entries = ranked.split_off(bounds.start);

        Self {
            entries,
            page: pagination.page(),
            total_pages: pagination.total_pages(),
            page_size: pagination.page_size(),
            total_matches,
            total_results,
            ranking,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::provider;

    #[test]
    fn test_rank_entries_grades_against_filtered_total() {
        let raw: Vec<Provider> = (1..=4)
            .map(|i| provider(&i.to_string(), &format!("Dr. {}", i), "Cardiology", "Ely"))
            .collect();
        let refs: Vec<&Provider> = raw.iter().collect();
        let links = ProviderLinks::new();

        let entries = rank_entries(&refs, &links);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[3].rank, 4);
        assert_eq!(entries[3].grade, Grade::F);

        assert_eq!(entries[2].grade, Grade::C);

        // Filtering out the first two moves the third provider up
        let narrowed = vec![&raw[2], &raw[3]];
        let entries = rank_entries(&narrowed, &links);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].provider.registry_number, "3");
        assert_eq!(entries[0].grade, Grade::B);
    }

    #[test]
    fn test_links_attached_by_name() {
        let raw = vec![provider("1", "Dr. Jane Doe", "Neurology", "Ely")];
        let refs: Vec<&Provider> = raw.iter().collect();
        let mut links = ProviderLinks::new();
        links.insert(
            "dr. jane doe",
            vec![SupplementalLink {
                title: "Migraine review".to_string(),
                url: "https://example.org/m".to_string(),
                kind: Some("publication".to_string()),
            }],
        );

        let entries = rank_entries(&refs, &links);
        assert_eq!(entries[0].links.map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_page_slice() {
        let raw: Vec<Provider> = (1..=23)
            .map(|i| provider(&i.to_string(), &format!("Dr. {}", i), "Cardiology", "Ely"))
            .collect();
        let refs: Vec<&Provider> = raw.iter().collect();
        let links = ProviderLinks::new();

        let ranked = rank_entries(&refs, &links);
        let pagination = Pagination::new(23, 10, 3);
        let page = ResultPage::build(ranked, pagination, 23, RankingSource::External);

        assert_eq!(page.entries.len(), 3);
        assert_eq!(page.entries[0].rank, 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_matches, 23);
    }
}
