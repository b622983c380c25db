//! Letter grade derived from rank position

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter band, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    D,
    F,
}

/// Upper percentile bound (inclusive) for each band except the last
const BANDS: &[(u64, Grade)] = &[
    (10, Grade::APlus),
    (20, Grade::A),
    (30, Grade::AMinus),
    (40, Grade::BPlus),
    (50, Grade::B),
    (60, Grade::BMinus),
    (70, Grade::CPlus),
    (80, Grade::C),
    (85, Grade::CMinus),
    (90, Grade::DPlus),
    (95, Grade::D),
];

impl Grade {
    pub const BEST: Grade = Grade::APlus;
    pub const WORST: Grade = Grade::F;

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Map a 1-based rank within `total` results to a letter grade
///
/// Percentile is `rank / total * 100`, compared against each band's upper
/// bound with `<=`. Integer cross-multiplication keeps band edges exact
/// (3 of 10 is exactly 30%, not 30.000000000000004%).
///
/// `total == 0` yields the worst grade.
pub fn grade(rank: usize, total: usize) -> Grade {
    if total == 0 {
        return Grade::WORST;
    }

    // Widened so no usize input can overflow
    let scaled_rank = rank as u128 * 100;
    let total = total as u128;

    BANDS
        .iter()
        .find(|(bound, _)| scaled_rank <= u128::from(*bound) * total)
        .map(|(_, g)| *g)
        .unwrap_or(Grade::WORST)
}
