//! Ranking scales used for journals and conferences.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error raised when a ranking label cannot be recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown ranking label: {0}")]
pub struct ParseRankingError(pub String);

/// Journal quartile as published by Scimago or Web of Science
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum QuartileRanking {
    Q1,
    Q2,
    Q3,
    Q4,
    /// Not ranked
    #[default]
    NR,
}

impl QuartileRanking {
    /// All the quartiles, best first
    pub const ALL: [QuartileRanking; 5] = [
        QuartileRanking::Q1,
        QuartileRanking::Q2,
        QuartileRanking::Q3,
        QuartileRanking::Q4,
        QuartileRanking::NR,
    ];

    /// Whether this value denotes an actual rank
    pub fn is_ranked(self) -> bool {
        self != QuartileRanking::NR
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuartileRanking::Q1 => "Q1",
            QuartileRanking::Q2 => "Q2",
            QuartileRanking::Q3 => "Q3",
            QuartileRanking::Q4 => "Q4",
            QuartileRanking::NR => "NR",
        }
    }
}

impl FromStr for QuartileRanking {
    type Err = ParseRankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        QuartileRanking::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| ParseRankingError(label.to_string()))
    }
}

impl fmt::Display for QuartileRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conference rank from the CORE portal
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CoreRanking {
    #[serde(rename = "A*", alias = "ASTAR")]
    AStar,
    A,
    B,
    C,
    /// Not ranked
    #[default]
    NR,
}

impl CoreRanking {
    pub fn is_ranked(self) -> bool {
        self != CoreRanking::NR
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoreRanking::AStar => "A*",
            CoreRanking::A => "A",
            CoreRanking::B => "B",
            CoreRanking::C => "C",
            CoreRanking::NR => "NR",
        }
    }
}

impl FromStr for CoreRanking {
    type Err = ParseRankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A*" | "ASTAR" | "A_STAR" => Ok(CoreRanking::AStar),
            "A" => Ok(CoreRanking::A),
            "B" => Ok(CoreRanking::B),
            "C" => Ok(CoreRanking::C),
            "NR" => Ok(CoreRanking::NR),
            _ => Err(ParseRankingError(s.trim().to_string())),
        }
    }
}

impl fmt::Display for CoreRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
