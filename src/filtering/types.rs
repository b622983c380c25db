// Shared types for result filtering
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Yes/no facets on a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanFacet {
    BoardCertified,
    AcceptingPatients,
}

impl BooleanFacet {
    pub fn value_of(&self, provider: &Provider) -> bool {
        match self {
            BooleanFacet::BoardCertified => provider.board_certified,
            BooleanFacet::AcceptingPatients => provider.accepting_patients,
        }
    }
}

/// Facets where the user picks any number of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiFacet {
    Language,
    Insurance,
    Specialty,
}

impl MultiFacet {
    /// Values a provider carries for this facet
    pub fn values_of<'a>(&self, provider: &'a Provider) -> Vec<&'a str> {
        match self {
            MultiFacet::Language => provider.languages.iter().map(|s| s.as_str()).collect(),
            MultiFacet::Insurance => provider.insurance.iter().map(|s| s.as_str()).collect(),
            MultiFacet::Specialty => vec![provider.specialty.as_str()],
        }
    }
}

/// Ordering applied after filtering
///
/// `Relevance` keeps the ranked order untouched. The other keys use a stable
/// sort, so providers that tie keep their ranked order relative to each
/// other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Relevance,
    /// Highest rating first, unrated last
    Rating,
    /// Most years of experience first, unknown last
    Experience,
    /// Alphabetical by display name
    Name,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Relevance => "relevance",
            SortKey::Rating => "rating",
            SortKey::Experience => "experience",
            SortKey::Name => "name",
        };
        f.write_str(s)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" | "rank" => Ok(SortKey::Relevance),
            "rating" => Ok(SortKey::Rating),
            "experience" => Ok(SortKey::Experience),
            "name" => Ok(SortKey::Name),
            other => Err(format!(
                "unknown sort key '{}', expected relevance, rating, experience or name",
                other
            )),
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// User-controlled view state over a result set
///
/// Created with defaults when a result view first loads, mutated by every
/// interaction, persisted after each mutation and restored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text search term; empty matches everything
    #[serde(default)]
    pub term: String,

    /// `None` means the facet is not applied
    #[serde(default)]
    pub board_certified: Option<bool>,

    #[serde(default)]
    pub accepting_patients: Option<bool>,

    #[serde(default)]
    pub languages: BTreeSet<String>,

    #[serde(default)]
    pub insurance: BTreeSet<String>,

    #[serde(default)]
    pub specialties: BTreeSet<String>,

    #[serde(default)]
    pub sort: SortKey,

    /// 1-based current page
    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl FilterState {
    /// Defaults with a specific page size (coerced to at least 1)
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            term: String::new(),
            board_certified: None,
            accepting_patients: None,
            languages: BTreeSet::new(),
            insurance: BTreeSet::new(),
            specialties: BTreeSet::new(),
            sort: SortKey::Relevance,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn requirement(&self, facet: BooleanFacet) -> Option<bool> {
        match facet {
            BooleanFacet::BoardCertified => self.board_certified,
            BooleanFacet::AcceptingPatients => self.accepting_patients,
        }
    }

    pub fn set_requirement(&mut self, facet: BooleanFacet, required: Option<bool>) {
        match facet {
            BooleanFacet::BoardCertified => self.board_certified = required,
            BooleanFacet::AcceptingPatients => self.accepting_patients = required,
        }
    }

    pub fn selected(&self, facet: MultiFacet) -> &BTreeSet<String> {
        match facet {
            MultiFacet::Language => &self.languages,
            MultiFacet::Insurance => &self.insurance,
            MultiFacet::Specialty => &self.specialties,
        }
    }

    pub fn selected_mut(&mut self, facet: MultiFacet) -> &mut BTreeSet<String> {
        match facet {
            MultiFacet::Language => &mut self.languages,
            MultiFacet::Insurance => &mut self.insurance,
            MultiFacet::Specialty => &mut self.specialties,
        }
    }

    /// Select `value` if it is not selected, otherwise deselect it
    ///
    /// Comparison ignores case and surrounding whitespace. Returns whether
    /// the value is selected afterwards.
    pub fn toggle(&mut self, facet: MultiFacet, value: &str) -> bool {
        let wanted = fold(value);
        if wanted.is_empty() {
            return false;
        }

        let selected = self.selected_mut(facet);
        let existing = selected.iter().find(|v| fold(v) == wanted).cloned();
        match existing {
            Some(v) => {
                selected.remove(&v);
                false
            }
            None => {
                selected.insert(value.trim().to_string());
                true
            }
        }
    }

    /// True when no predicate would exclude anything
    pub fn is_unfiltered(&self) -> bool {
        self.term.trim().is_empty()
            && self.board_certified.is_none()
            && self.accepting_patients.is_none()
            && self.languages.is_empty()
            && self.insurance.is_empty()
            && self.specialties.is_empty()
    }

    /// Combined predicate: text match AND every active facet
    pub fn matches(&self, provider: &Provider) -> bool {
        self.matches_term(provider)
            && [BooleanFacet::BoardCertified, BooleanFacet::AcceptingPatients]
                .iter()
                .all(|facet| match self.requirement(*facet) {
                    Some(required) => facet.value_of(provider) == required,
                    None => true,
                })
            && [MultiFacet::Language, MultiFacet::Insurance, MultiFacet::Specialty]
                .iter()
                .all(|facet| self.matches_selection(*facet, provider))
    }

    /// Case-insensitive substring match on name, specialty or city
    fn matches_term(&self, provider: &Provider) -> bool {
        let term = fold(&self.term);
        if term.is_empty() {
            return true;
        }

        [
            provider.name.as_str(),
            provider.specialty.as_str(),
            provider.address.city.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Passes when nothing is selected or the provider has any selected value
    fn matches_selection(&self, facet: MultiFacet, provider: &Provider) -> bool {
        let selected = self.selected(facet);
        if selected.is_empty() {
            return true;
        }

        let wanted: Vec<String> = selected.iter().map(|v| fold(v)).collect();
        facet
            .values_of(provider)
            .iter()
            .any(|value| wanted.contains(&fold(value)))
    }
}

/// Lowercase and trim for comparisons
pub(crate) fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}
