//! Proposal and application of journal and conference ranking updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{format_category, CoreRankingTable, JournalQuartiles, ScimagoRanking, WosRanking};
use crate::models::{Conference, ConferenceId, CoreRanking, Journal, JournalId, QuartileRanking};

/// Platform an update comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPlatform {
    Scimago,
    WebOfScience,
}

impl fmt::Display for RankingPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingPlatform::Scimago => write!(f, "Scimago"),
            RankingPlatform::WebOfScience => write!(f, "WoS"),
        }
    }
}

/// Quartiles found for a journal, to be reviewed before being applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRankingUpdate {
    pub journal_id: JournalId,
    pub journal_name: String,
    pub platform: RankingPlatform,
    pub reference_year: i32,

    /// Formatted category of the journal, if one is set
    pub category: Option<String>,

    /// Quartile currently known for the reference year
    pub previous: QuartileRanking,

    /// The quartile of the journal category when it was found, otherwise
    /// the quartiles of every category of the journal
    pub candidates: BTreeMap<String, QuartileRanking>,

    /// Impact factor currently known for the reference year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_impact_factor: Option<f32>,

    /// Impact factor read from the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_factor: Option<f32>,
}

impl JournalRankingUpdate {
    /// The quartile to record: the only candidate, if there is exactly one
    pub fn selected(&self) -> Option<QuartileRanking> {
        match self.candidates.len() {
            1 => self.candidates.values().next().copied(),
            _ => None,
        }
    }

    /// Whether applying the update changes the journal
    pub fn is_change(&self) -> bool {
        let quartile_changed = self.selected().is_some_and(|q| q != self.previous);
        let impact_factor_changed = match (self.impact_factor, self.previous_impact_factor) {
            (Some(new), Some(old)) => new > 0.0 && (new - old).abs() > f32::EPSILON,
            (Some(new), None) => new > 0.0,
            _ => false,
        };
        quartile_changed || impact_factor_changed
    }
}

/// CORE rank found for a conference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceRankingUpdate {
    pub conference_id: ConferenceId,
    pub conference_name: String,
    pub reference_year: i32,

    /// Identifier of the matching entry on the CORE portal
    pub core_id: Option<String>,

    /// Rank currently known for the reference year
    pub previous: CoreRanking,

    /// Rank read from the table, if the conference was found
    pub ranking: Option<CoreRanking>,
}

impl ConferenceRankingUpdate {
    pub fn is_change(&self) -> bool {
        self.ranking.is_some_and(|rank| rank != self.previous)
    }
}

/// Builds the ranking updates of a reference year
#[derive(Debug, Clone, Copy)]
pub struct RankingUpdater {
    reference_year: i32,
}

impl RankingUpdater {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    fn candidates(
        quartiles: Option<&JournalQuartiles>,
        category: Option<&str>,
    ) -> BTreeMap<String, QuartileRanking> {
        let Some(quartiles) = quartiles else {
            return BTreeMap::new();
        };
        if let Some((name, quartile)) = category.and_then(|c| quartiles.find_category(c)) {
            return BTreeMap::from([(name.to_string(), quartile)]);
        }
        quartiles
            .categories()
            .map(|(name, quartile)| (name.to_string(), quartile))
            .collect()
    }

    fn formatted(category: Option<&str>) -> Option<String> {
        category.map(format_category).filter(|c| !c.is_empty())
    }

    /// Updates for the journals having a Scimago identifier
    pub fn scimago_updates(&self, journals: &[Journal], ranking: &ScimagoRanking) -> Vec<JournalRankingUpdate> {
        let year = self.reference_year;
        journals
            .iter()
            .filter_map(|journal| {
                let scimago_id = journal.scimago_id.as_deref()?.trim();
                if scimago_id.is_empty() {
                    return None;
                }
                let category = Self::formatted(journal.scimago_category.as_deref());
                tracing::debug!(journal = %journal.name, scimago_id, "Reconciling Scimago quartile");
                Some(JournalRankingUpdate {
                    journal_id: journal.id,
                    journal_name: journal.name.clone(),
                    platform: RankingPlatform::Scimago,
                    reference_year: year,
                    candidates: Self::candidates(ranking.get(scimago_id), category.as_deref()),
                    category,
                    previous: journal.scimago_q_index_by_year(year),
                    previous_impact_factor: None,
                    impact_factor: None,
                })
            })
            .collect()
    }

    /// Updates for the journals having a WoS identifier or an ISSN
    pub fn wos_updates(&self, journals: &[Journal], ranking: &WosRanking) -> Vec<JournalRankingUpdate> {
        let year = self.reference_year;
        journals
            .iter()
            .filter_map(|journal| {
                let issn = journal
                    .wos_id
                    .as_deref()
                    .or(journal.issn.as_deref())
                    .map(str::trim)
                    .filter(|id| !id.is_empty())?;
                let category = Self::formatted(journal.wos_category.as_deref());
                let entry = ranking.get(issn);
                tracing::debug!(journal = %journal.name, issn, "Reconciling WoS quartile");
                Some(JournalRankingUpdate {
                    journal_id: journal.id,
                    journal_name: journal.name.clone(),
                    platform: RankingPlatform::WebOfScience,
                    reference_year: year,
                    candidates: Self::candidates(entry.map(|e| &e.quartiles), category.as_deref()),
                    category,
                    previous: journal.wos_q_index_by_year(year),
                    previous_impact_factor: Some(journal.impact_factor_by_year(year)),
                    impact_factor: entry.map(|e| e.impact_factor),
                })
            })
            .collect()
    }

    /// Updates for every conference, matched by CORE identifier, acronym
    /// or name
    pub fn core_updates(
        &self,
        conferences: &[Conference],
        table: &CoreRankingTable,
    ) -> Vec<ConferenceRankingUpdate> {
        let year = self.reference_year;
        conferences
            .iter()
            .map(|conference| {
                let entry = table.find(conference);
                tracing::debug!(
                    conference = %conference.name,
                    found = entry.is_some(),
                    "Reconciling CORE rank"
                );
                ConferenceRankingUpdate {
                    conference_id: conference.id,
                    conference_name: conference.name.clone(),
                    reference_year: year,
                    core_id: entry.map(|e| e.core_id.clone()),
                    previous: conference.core_index_by_year(year),
                    ranking: entry.map(|e| e.ranking),
                }
            })
            .collect()
    }

    /// Record the CORE ranks in the conferences, and their CORE identifier
    /// when it was missing. Returns the number of conferences modified.
    pub fn apply_core(
        &self,
        conferences: &mut [Conference],
        updates: &[ConferenceRankingUpdate],
    ) -> usize {
        let year = self.reference_year;
        let mut changed = 0;
        for update in updates.iter().filter(|u| u.is_change()) {
            let Some(conference) = conferences
                .iter_mut()
                .find(|c| c.id == update.conference_id)
            else {
                tracing::warn!(
                    conference_id = update.conference_id,
                    "Unknown conference in ranking update"
                );
                continue;
            };
            if let Some(rank) = update.ranking {
                conference.set_core_index_by_year(year, rank);
            }
            if conference.core_id.is_none() {
                conference.core_id = update.core_id.clone();
            }
            tracing::info!(
                conference = %conference.name,
                year,
                "Updated conference ranking"
            );
            changed += 1;
        }
        changed
    }

    /// Record the selected quartiles and impact factors in the journals.
    ///
    /// Updates without a single selected quartile only change the impact
    /// factor. Returns the number of journals modified.
    pub fn apply(&self, journals: &mut [Journal], updates: &[JournalRankingUpdate]) -> usize {
        let year = self.reference_year;
        let mut changed = 0;
        for update in updates.iter().filter(|u| u.is_change()) {
            let Some(journal) = journals.iter_mut().find(|j| j.id == update.journal_id) else {
                tracing::warn!(journal_id = update.journal_id, "Unknown journal in ranking update");
                continue;
            };
            if let Some(quartile) = update.selected() {
                match update.platform {
                    RankingPlatform::Scimago => {
                        journal.set_scimago_q_index_by_year(year, quartile);
                    }
                    RankingPlatform::WebOfScience => {
                        journal.set_wos_q_index_by_year(year, quartile);
                    }
                }
            }
            if let Some(impact_factor) = update.impact_factor.filter(|f| *f > 0.0) {
                journal.set_impact_factor_by_year(year, impact_factor);
            }
            tracing::info!(
                journal = %journal.name,
                platform = %update.platform,
                year,
                "Updated journal ranking"
            );
            changed += 1;
        }
        changed
    }
}
