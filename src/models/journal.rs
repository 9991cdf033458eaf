//! Journal model with its annual quality indicators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::QuartileRanking;

/// Identifier of a journal
pub type JournalId = u64;

/// Quality indicators of a journal for one reference year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalQualityAnnualIndicators {
    /// Year the indicators refer to
    pub reference_year: i32,

    /// Quartile on Scimago, if known for this year
    #[serde(default)]
    pub scimago_q_index: Option<QuartileRanking>,

    /// Quartile on Web of Science, if known for this year
    #[serde(default)]
    pub wos_q_index: Option<QuartileRanking>,

    /// Journal impact factor (0 when unknown)
    #[serde(default)]
    pub impact_factor: f32,
}

impl JournalQualityAnnualIndicators {
    pub fn new(reference_year: i32) -> Self {
        Self {
            reference_year,
            scimago_q_index: None,
            wos_q_index: None,
            impact_factor: 0.0,
        }
    }
}

/// A scientific journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,

    /// Journal name
    pub name: String,

    /// ISSN number
    #[serde(default)]
    pub issn: Option<String>,

    /// Identifier of the journal on the Scimago website
    #[serde(default)]
    pub scimago_id: Option<String>,

    /// Scientific category used for selecting the Scimago quartile
    #[serde(default)]
    pub scimago_category: Option<String>,

    /// Identifier of the journal on Web of Science
    #[serde(default)]
    pub wos_id: Option<String>,

    /// Scientific category used for selecting the Web of Science quartile
    #[serde(default)]
    pub wos_category: Option<String>,

    /// Quality indicators indexed by reference year
    #[serde(default)]
    pub quality_indicators: BTreeMap<i32, JournalQualityAnnualIndicators>,
}

impl Journal {
    /// Create a journal without ranking information
    pub fn new(id: JournalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            issn: None,
            scimago_id: None,
            scimago_category: None,
            wos_id: None,
            wos_category: None,
            quality_indicators: BTreeMap::new(),
        }
    }

    /// Indicators recorded for exactly the given year
    pub fn quality_indicators_for_year(&self, year: i32) -> Option<&JournalQualityAnnualIndicators> {
        self.quality_indicators.get(&year)
    }

    /// Most recent indicators at or before `year` that satisfy `selector`
    ///
    /// Rankings are not published every year, so a missing year falls back
    /// to the closest earlier one.
    pub fn quality_indicators_for<F>(&self, year: i32, selector: F) -> Option<&JournalQualityAnnualIndicators>
    where
        F: Fn(&JournalQualityAnnualIndicators) -> bool,
    {
        self.quality_indicators
            .range(..=year)
            .rev()
            .map(|(_, indicators)| indicators)
            .find(|indicators| selector(indicators))
    }

    pub fn scimago_q_index_by_year(&self, year: i32) -> QuartileRanking {
        self.quality_indicators_for(year, |it| it.scimago_q_index.is_some())
            .and_then(|it| it.scimago_q_index)
            .unwrap_or_default()
    }

    pub fn wos_q_index_by_year(&self, year: i32) -> QuartileRanking {
        self.quality_indicators_for(year, |it| it.wos_q_index.is_some())
            .and_then(|it| it.wos_q_index)
            .unwrap_or_default()
    }

    pub fn impact_factor_by_year(&self, year: i32) -> f32 {
        self.quality_indicators_for(year, |it| it.impact_factor > 0.0)
            .map(|it| it.impact_factor)
            .unwrap_or(0.0)
    }

    pub fn has_scimago_q_index_for_year(&self, year: i32) -> bool {
        self.scimago_q_index_by_year(year).is_ranked()
    }

    pub fn has_wos_q_index_for_year(&self, year: i32) -> bool {
        self.wos_q_index_by_year(year).is_ranked()
    }

    pub fn has_impact_factor_for_year(&self, year: i32) -> bool {
        self.impact_factor_by_year(year) > 0.0
    }

    /// Whether the journal has any quartile for the given year
    pub fn is_ranked_for_year(&self, year: i32) -> bool {
        self.has_scimago_q_index_for_year(year) || self.has_wos_q_index_for_year(year)
    }

    fn indicators_mut(&mut self, year: i32) -> &mut JournalQualityAnnualIndicators {
        self.quality_indicators
            .entry(year)
            .or_insert_with(|| JournalQualityAnnualIndicators::new(year))
    }

    pub fn set_scimago_q_index_by_year(
        &mut self,
        year: i32,
        quartile: QuartileRanking,
    ) -> &mut JournalQualityAnnualIndicators {
        let indicators = self.indicators_mut(year);
        indicators.scimago_q_index = Some(quartile);
        indicators
    }

    pub fn set_wos_q_index_by_year(
        &mut self,
        year: i32,
        quartile: QuartileRanking,
    ) -> &mut JournalQualityAnnualIndicators {
        let indicators = self.indicators_mut(year);
        indicators.wos_q_index = Some(quartile);
        indicators
    }

    pub fn set_impact_factor_by_year(
        &mut self,
        year: i32,
        impact_factor: f32,
    ) -> &mut JournalQualityAnnualIndicators {
        let indicators = self.indicators_mut(year);
        indicators.impact_factor = impact_factor.max(0.0);
        indicators
    }
}
