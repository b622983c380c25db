// Client-side filtering over a ranked result set
//
// Filtering always starts from the full raw list. Re-filtering an already
// filtered list would compound stale predicates, so no function here takes
// a previously filtered list as input.

mod types;

pub use types::{BooleanFacet, FilterState, MultiFacet, SortKey, DEFAULT_PAGE_SIZE};

use crate::provider::Provider;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Apply `state` to the raw (ranked, unfiltered) list
///
/// Returns references in display order: ranked order for
/// `SortKey::Relevance`, otherwise a stable sort over the filtered set.
pub fn apply<'a>(raw: &'a [Provider], state: &FilterState) -> Vec<&'a Provider> {
    let mut filtered: Vec<&Provider> = raw.iter().filter(|p| state.matches(p)).collect();
    sort_providers(&mut filtered, state.sort);
    filtered
}

/// Stable sort by `key`; ties keep their incoming order
pub fn sort_providers(providers: &mut [&Provider], key: SortKey) {
    match key {
        SortKey::Relevance => {}
        SortKey::Rating => providers.sort_by(|a, b| descending_some_first(a.rating, b.rating)),
        SortKey::Experience => {
            providers.sort_by(|a, b| descending_some_first(a.years_experience, b.years_experience))
        }
        SortKey::Name => providers.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
}

fn descending_some_first<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct values available for a multi-select facet, with counts
///
/// Values are grouped case-insensitively; the first spelling seen is kept
/// for display. Sorted alphabetically.
pub fn facet_values(raw: &[Provider], facet: MultiFacet) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();

    for provider in raw {
        for value in facet.values_of(provider) {
            let key = types::fold(value);
            if key.is_empty() {
                continue;
            }
            counts
                .entry(key)
                .or_insert_with(|| (value.trim().to_string(), 0))
                .1 += 1;
        }
    }

    counts.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::provider;

    fn sample() -> Vec<Provider> {
        let mut a = provider("1", "Dr. Alice Park", "Cardiology", "Minneapolis");
        a.board_certified = true;
        a.accepting_patients = true;
        a.languages = vec!["English".to_string(), "Korean".to_string()];
        a.insurance = vec!["Medica".to_string()];
        a.rating = Some(4.2);
        a.years_experience = Some(12);

        let mut b = provider("2", "Dr. Bob Stone", "Neurology", "St. Paul");
        b.board_certified = false;
        b.accepting_patients = true;
        b.languages = vec!["English".to_string()];
        b.insurance = vec!["HealthPartners".to_string(), "Medica".to_string()];
        b.rating = Some(4.8);

        let mut c = provider("3", "Dr. Carla Ruiz", "Cardiology", "Duluth");
        c.board_certified = true;
        c.accepting_patients = false;
        c.languages = vec!["Spanish".to_string(), "english".to_string()];
        c.years_experience = Some(20);

        vec![a, b, c]
    }

    fn numbers(list: &[&Provider]) -> Vec<String> {
        list.iter().map(|p| p.registry_number.clone()).collect()
    }

    #[test]
    fn test_default_state_keeps_everything_in_order() {
        let raw = sample();
        let filtered = apply(&raw, &FilterState::default());
        assert_eq!(numbers(&filtered), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_term_matches_any_field_case_insensitively() {
        let raw = sample();
        let mut state = FilterState::default();

        state.term = "CARDIO".to_string();
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1", "3"]);

        state.term = "paul".to_string();
        assert_eq!(numbers(&apply(&raw, &state)), vec!["2"]);

        state.term = "ruiz".to_string();
        assert_eq!(numbers(&apply(&raw, &state)), vec!["3"]);

        state.term = "  ".to_string();
        assert_eq!(apply(&raw, &state).len(), 3);
    }

    #[test]
    fn test_boolean_facets_are_anded() {
        let raw = sample();
        let mut state = FilterState::default();

        state.board_certified = Some(true);
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1", "3"]);

        state.accepting_patients = Some(true);
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1"]);

        state.board_certified = Some(false);
        assert_eq!(numbers(&apply(&raw, &state)), vec!["2"]);
    }

    #[test]
    fn test_multi_select_is_any_of() {
        let raw = sample();
        let mut state = FilterState::default();

        state.toggle(MultiFacet::Language, "Korean");
        state.toggle(MultiFacet::Language, "spanish");
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1", "3"]);

        state.toggle(MultiFacet::Insurance, "medica");
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1"]);
    }

    #[test]
    fn test_toggle_deselects_case_insensitively() {
        let mut state = FilterState::default();
        assert!(state.toggle(MultiFacet::Language, "English"));
        assert!(!state.toggle(MultiFacet::Language, " english "));
        assert!(state.languages.is_empty());
        assert!(!state.toggle(MultiFacet::Language, "   "));
    }

    #[test]
    fn test_sort_by_rating_puts_unrated_last() {
        let raw = sample();
        let mut state = FilterState::default();
        state.sort = SortKey::Rating;
        assert_eq!(numbers(&apply(&raw, &state)), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_sort_by_experience_is_stable_for_ties() {
        let mut raw = sample();
        raw[1].years_experience = None;
        raw.push(provider("4", "Dr. Dan Oh", "Cardiology", "Ely"));

        let mut state = FilterState::default();
        state.sort = SortKey::Experience;
        assert_eq!(numbers(&apply(&raw, &state)), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut raw = sample();
        raw.reverse();
        let mut state = FilterState::default();
        state.sort = SortKey::Name;
        assert_eq!(numbers(&apply(&raw, &state)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_facet_values_group_case_insensitively() {
        let raw = sample();
        let languages = facet_values(&raw, MultiFacet::Language);
        assert_eq!(
            languages,
            vec![
                ("English".to_string(), 3),
                ("Korean".to_string(), 1),
                ("Spanish".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("Rating".parse::<SortKey>().unwrap(), SortKey::Rating);
        assert_eq!("rank".parse::<SortKey>().unwrap(), SortKey::Relevance);
        assert!("price".parse::<SortKey>().is_err());
    }
}
