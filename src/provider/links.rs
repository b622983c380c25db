//! Supplemental per-provider links returned by the ranking lookup
//!
//! The ranking collaborator keys its link map by display name, not by
//! registry number, so two providers with the same name share one entry.
//! The mapping is kept as-is; resolving duplicates needs a contract change
//! on the collaborator side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bibliographic or media link attached to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalLink {
    pub title: String,
    pub url: String,
    /// e.g. "publication", "video"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Name-keyed link map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderLinks(BTreeMap<String, Vec<SupplementalLink>>);

impl ProviderLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert links under the normalized form of `name`, appending to any
    /// links already stored for that name
    pub fn insert(&mut self, name: &str, links: Vec<SupplementalLink>) {
        self.0
            .entry(normalize_name(name))
            .or_default()
            .extend(links);
    }

    /// Look up links by display name
    pub fn get(&self, name: &str) -> Option<&[SupplementalLink]> {
        self.0.get(&normalize_name(name)).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<SupplementalLink>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<SupplementalLink>)> for ProviderLinks {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SupplementalLink>)>>(iter: I) -> Self {
        let mut links = ProviderLinks::new();
        for (name, entries) in iter {
            links.insert(&name, entries);
        }
        links
    }
}

/// Case- and whitespace-normalize a display name for use as a link key
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
