//! Apply an externally supplied ranking to the raw directory list

use crate::provider::Provider;
use ahash::AHashMap;
use std::collections::VecDeque;

/// Directory list split by an external order
#[derive(Debug, Clone, Default)]
pub struct Reordered {
    /// Providers named by the order, in that order
    pub ranked: Vec<Provider>,
    /// Providers the order never named, in directory order
    pub unclaimed: Vec<Provider>,
}

/// Reorder `providers` to follow `order` (a list of registry numbers)
///
/// The ranking lookup is authoritative for membership as well as order:
/// providers whose registry number does not appear in `order` end up in
/// [`Reordered::unclaimed`] and are not part of the ranked list. Unknown
/// numbers in `order` are skipped. If the directory returned the same
/// registry number more than once, each occurrence in `order` claims the
/// next unclaimed provider with that number.
pub fn apply_external_order(providers: Vec<Provider>, order: &[String]) -> Reordered {
    let mut slots: Vec<Option<Provider>> = providers.into_iter().map(Some).collect();

    let mut by_number: AHashMap<String, VecDeque<usize>> = AHashMap::new();
    for (index, provider) in slots.iter().enumerate() {
        if let Some(p) = provider {
            by_number
                .entry(p.registry_number.trim().to_string())
                .or_default()
                .push_back(index);
        }
    }

    let mut ranked = Vec::with_capacity(order.len().min(slots.len()));
    let mut unknown = 0usize;

    for number in order {
        let index = by_number
            .get_mut(number.trim())
            .and_then(|queue| queue.pop_front());

        match index.and_then(|i| slots[i].take()) {
            Some(provider) => ranked.push(provider),
            None => unknown += 1,
        }
    }

    if unknown > 0 {
        tracing::debug!(
            "Ranking referenced {} registry numbers not in the directory result",
            unknown
        );
    }

    let unclaimed: Vec<Provider> = slots.into_iter().flatten().collect();
    if !unclaimed.is_empty() {
        tracing::debug!("Dropped {} providers absent from the ranking", unclaimed.len());
    }

    Reordered { ranked, unclaimed }
}
