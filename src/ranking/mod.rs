//! Ranking: external order, randomized fallback and letter grades
//!
//! Relevance itself comes from the ranking collaborator. This module only
//! stabilizes that order, substitutes a random one when it is missing, and
//! turns positions into grades.

mod fallback;
mod grade;
mod reorder;

pub use fallback::{fallback_order, fisher_yates};
pub use grade::{grade, Grade};
pub use reorder::{apply_external_order, Reordered};

use serde::{Deserialize, Serialize};

/// Where the order of a result set came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingSource {
    /// Order asserted by the ranking collaborator
    #[default]
    External,
    /// Random order; no semantic ranking was available
    Fallback,
}

impl RankingSource {
    pub fn is_ranked(&self) -> bool {
        matches!(self, RankingSource::External)
    }
}
