//! Conference model with its CORE ranks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CoreRanking;

/// Identifier of a conference
pub type ConferenceId = u64;

/// A scientific conference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: ConferenceId,

    /// Conference name
    pub name: String,

    /// Short name, e.g. "ICRA"
    #[serde(default)]
    pub acronym: Option<String>,

    /// Identifier of the conference on the CORE portal
    #[serde(default)]
    pub core_id: Option<String>,

    /// CORE rank indexed by reference year
    #[serde(default)]
    pub core_indicators: BTreeMap<i32, CoreRanking>,
}

impl Conference {
    pub fn new(id: ConferenceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            acronym: None,
            core_id: None,
            core_indicators: BTreeMap::new(),
        }
    }

    /// CORE rank for the given year, falling back to the closest earlier year
    pub fn core_index_by_year(&self, year: i32) -> CoreRanking {
        self.core_indicators
            .range(..=year)
            .next_back()
            .map(|(_, rank)| *rank)
            .unwrap_or_default()
    }

    pub fn set_core_index_by_year(&mut self, year: i32, rank: CoreRanking) {
        self.core_indicators.insert(year, rank);
    }

    pub fn is_ranked_for_year(&self, year: i32) -> bool {
        self.core_index_by_year(year).is_ranked()
    }
}
