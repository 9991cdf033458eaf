//! CORE conference rankings.
//!
//! The CORE portal exports its ranking as a comma-separated file without
//! header row. The first columns are the portal identifier, the title, the
//! acronym, the edition (e.g. "CORE2023") and the rank.

use std::collections::BTreeMap;
use std::io::Read;

use super::csv_table::{self, field};
use super::{format_category, RankingError};
use crate::models::{Conference, CoreRanking};

const ID_COLUMN: usize = 0;
const TITLE_COLUMN: usize = 1;
const ACRONYM_COLUMN: usize = 2;
const SOURCE_COLUMN: usize = 3;
const RANK_COLUMN: usize = 4;

/// CORE rank from a rank label; national, regional and unranked labels
/// give [`CoreRanking::NR`]
pub fn parse_rank(raw: &str) -> CoreRanking {
    raw.trim().parse().unwrap_or_default()
}

/// One conference of the CORE table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConference {
    pub core_id: String,
    pub title: String,
    pub acronym: Option<String>,

    /// Edition of the ranking, e.g. "CORE2023"
    pub source: Option<String>,
    pub ranking: CoreRanking,
}

/// CORE table indexed by portal identifier, acronym and title
#[derive(Debug, Clone, Default)]
pub struct CoreRankingTable {
    conferences: Vec<CoreConference>,
    by_id: BTreeMap<String, usize>,
    by_acronym: BTreeMap<String, usize>,
    by_title: BTreeMap<String, usize>,
}

impl CoreRankingTable {
    fn push(&mut self, conference: CoreConference) {
        let index = self.conferences.len();
        self.by_id.entry(conference.core_id.clone()).or_insert(index);
        if let Some(acronym) = &conference.acronym {
            self.by_acronym
                .entry(acronym.to_uppercase())
                .or_insert(index);
        }
        self.by_title
            .entry(format_category(&conference.title))
            .or_insert(index);
        self.conferences.push(conference);
    }

    pub fn get_by_id(&self, core_id: &str) -> Option<&CoreConference> {
        self.by_id
            .get(core_id.trim())
            .map(|index| &self.conferences[*index])
    }

    pub fn get_by_acronym(&self, acronym: &str) -> Option<&CoreConference> {
        self.by_acronym
            .get(&acronym.trim().to_uppercase())
            .map(|index| &self.conferences[*index])
    }

    pub fn get_by_title(&self, title: &str) -> Option<&CoreConference> {
        self.by_title
            .get(&format_category(title))
            .map(|index| &self.conferences[*index])
    }

    /// Entry of a conference: by CORE identifier when it has one, otherwise
    /// by acronym, then by name
    pub fn find(&self, conference: &Conference) -> Option<&CoreConference> {
        let core_id = conference
            .core_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(core_id) = core_id {
            return self.get_by_id(core_id);
        }
        conference
            .acronym
            .as_deref()
            .and_then(|acronym| self.get_by_acronym(acronym))
            .or_else(|| self.get_by_title(&conference.name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoreConference> {
        self.conferences.iter()
    }

    pub fn len(&self) -> usize {
        self.conferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conferences.is_empty()
    }
}

/// Read a CORE portal CSV export
pub fn read_conference_ranking<R: Read>(input: R) -> Result<CoreRankingTable, RankingError> {
    let mut reader = csv_table::reader_with_delimiter(input, b',');
    let mut table = CoreRankingTable::default();

    for record in csv_table::records(&mut reader) {
        let record = record?;
        let (Some(core_id), Some(title)) = (
            field(&record, Some(ID_COLUMN)),
            field(&record, Some(TITLE_COLUMN)),
        ) else {
            continue;
        };
        // Exports edited by hand may carry a header row
        if core_id.eq_ignore_ascii_case("id") && title.eq_ignore_ascii_case("title") {
            continue;
        }
        table.push(CoreConference {
            core_id: core_id.to_string(),
            title: title.to_string(),
            acronym: field(&record, Some(ACRONYM_COLUMN)).map(str::to_string),
            source: field(&record, Some(SOURCE_COLUMN)).map(str::to_string),
            ranking: field(&record, Some(RANK_COLUMN))
                .map(parse_rank)
                .unwrap_or_default(),
        });
    }

    if table.is_empty() {
        return Err(RankingError::Format(
            "no conference in the CORE table".to_string(),
        ));
    }
    tracing::debug!(conferences = table.len(), "Read CORE ranking table");
    Ok(table)
}
