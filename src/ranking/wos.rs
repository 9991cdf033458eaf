//! Web of Science Journal Citation Reports tables.
//!
//! The reports are not publicly downloadable: the table of a year is read
//! from a CSV export supplied by the user. Journals are indexed by their
//! normalized ISSN and electronic ISSN.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use super::csv_table::{self, field, find_column, header_name};
use super::{JournalQuartiles, RankingError};
use crate::models::QuartileRanking;

const ISSN_COLUMN: &str = "ISSN";
const EISSN_COLUMN: &str = "EISSN";
const CATEGORY_COLUMN: &str = "Category & Journal Quartiles";
const IMPACT_FACTOR_COLUMN: &str = "IF";

static CATEGORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)(?:\s*-.*)?\s*\(([^)]+)\)\s*$").expect("Invalid WoS category regex")
});

/// ISSN reduced to its digits and check character, in upper case
pub fn normalize_issn(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Split a "Category & Journal Quartiles" cell such as
/// `COMPUTER SCIENCE, ARTIFICIAL INTELLIGENCE - SCIE(Q1);ROBOTICS - SCIE(Q2)`.
///
/// The edition suffix (`- SCIE`) is dropped from the category name.
pub fn parse_categories(raw: &str) -> Vec<(String, QuartileRanking)> {
    raw.split(';')
        .filter_map(|entry| {
            let captures = CATEGORY_PATTERN.captures(entry)?;
            let name = captures.get(1)?.as_str();
            let quartile = captures.get(2)?.as_str().parse::<QuartileRanking>().ok()?;
            (!name.is_empty()).then(|| (name.to_string(), quartile))
        })
        .collect()
}

/// Ranking of one journal in the reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WosJournal {
    pub quartiles: JournalQuartiles,

    /// Journal impact factor (0 when unknown)
    pub impact_factor: f32,
}

/// Journals of a yearly report, indexed by normalized ISSN
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WosRanking {
    journals: BTreeMap<String, Arc<WosJournal>>,
}

impl WosRanking {
    /// Ranking of the journal with the given ISSN or electronic ISSN
    pub fn get(&self, issn: &str) -> Option<&WosJournal> {
        self.journals.get(&normalize_issn(issn)).map(Arc::as_ref)
    }

    /// Number of indexed ISSNs
    pub fn len(&self) -> usize {
        self.journals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }
}

fn is_impact_factor_column(header: &str) -> bool {
    let name = header_name(header);
    name.eq_ignore_ascii_case(IMPACT_FACTOR_COLUMN)
        || name
            .get(..IMPACT_FACTOR_COLUMN.len() + 1)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("IF "))
}

/// Read a Journal Citation Reports CSV export
pub fn read_journal_ranking<R: Read>(input: R) -> Result<WosRanking, RankingError> {
    let mut reader = csv_table::reader(input);
    let mut records = csv_table::records(&mut reader);

    let missing_issn =
        || RankingError::Format(format!("unable to find the column \"{}\"", ISSN_COLUMN));
    let headers = match records.next() {
        Some(headers) => headers?,
        None => return Err(missing_issn()),
    };

    let issn_column = find_column(&headers, ISSN_COLUMN);
    let eissn_column = find_column(&headers, EISSN_COLUMN);
    let category_column = find_column(&headers, CATEGORY_COLUMN);
    let impact_factor_column = headers.iter().position(is_impact_factor_column);

    if issn_column.is_none() && eissn_column.is_none() {
        return Err(missing_issn());
    }
    if category_column.is_none() {
        return Err(RankingError::Format(
            "no column for quartiles in the WoS table".to_string(),
        ));
    }

    let mut journals = BTreeMap::new();
    for record in records {
        let record = record?;
        let mut quartiles = JournalQuartiles::new();
        if let Some(raw) = field(&record, category_column) {
            for (name, quartile) in parse_categories(raw) {
                quartiles.insert(&name, quartile);
            }
        }
        if quartiles.is_empty() {
            continue;
        }
        let impact_factor = field(&record, impact_factor_column)
            .and_then(|raw| raw.replace(',', ".").parse::<f32>().ok())
            .unwrap_or(0.0);
        let journal = Arc::new(WosJournal {
            quartiles,
            impact_factor,
        });
        for column in [issn_column, eissn_column] {
            // Placeholders such as "N/A" carry no digit
            if let Some(issn) = field(&record, column).map(normalize_issn) {
                if issn.chars().any(|c| c.is_ascii_digit()) {
                    journals.insert(issn, journal.clone());
                }
            }
        }
    }

    tracing::debug!(issns = journals.len(), "Read WoS ranking table");
    Ok(WosRanking { journals })
}

/// Yearly WoS tables, each read once
#[derive(Debug, Default)]
pub struct WosRankingCache {
    rankings: Mutex<HashMap<i32, Arc<WosRanking>>>,
}

impl WosRankingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of the given year; `open` is only called when the year was
    /// never read. A failed read is not remembered.
    pub fn journal_ranking<R, F>(&self, year: i32, open: F) -> Result<Arc<WosRanking>, RankingError>
    where
        R: Read,
        F: FnOnce() -> Result<R, RankingError>,
    {
        let mut rankings = self.rankings.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ranking) = rankings.get(&year) {
            return Ok(ranking.clone());
        }
        tracing::info!(year, "Reading the WoS ranking table");
        let ranking = Arc::new(read_journal_ranking(open()?)?);
        rankings.insert(year, ranking.clone());
        Ok(ranking)
    }
}
