//! Reconciliation of journal rankings published by external platforms.
//!
//! Two journal platforms are supported:
//!
//! - [`scimago`]: the public Scimago Journal Rank, queried either through the
//!   small indicator picture of a journal or through the yearly CSV table;
//! - [`wos`]: the Web of Science Journal Citation Reports, read from a CSV
//!   export provided by the user.
//!
//! Both produce, for each journal, a [`JournalQuartiles`] map from scientific
//! category to quartile. Conference ranks are read from a CORE portal export
//! by [`core_portal`]. The [`RankingUpdater`] turns those tables into
//! proposed updates of the journals' and conferences' annual indicators.

pub mod core_portal;
mod csv_table;
pub mod scimago;
mod updater;
pub mod wos;

pub use core_portal::{CoreConference, CoreRankingTable};
pub use scimago::{OnlineScimagoPlatform, ScimagoPlatform, ScimagoRanking};
pub use updater::{ConferenceRankingUpdate, JournalRankingUpdate, RankingPlatform, RankingUpdater};
pub use wos::{WosJournal, WosRanking, WosRankingCache};

use std::collections::BTreeMap;

use crate::models::QuartileRanking;

/// Key of the best quartile of a journal over all its categories.
///
/// Category keys are lower-case, so this key never collides with them.
pub const BEST: &str = "BEST";

/// Minimum Jaro-Winkler similarity for two category names to be considered
/// the same
pub const CATEGORY_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Errors that can occur when fetching or reading ranking tables
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Malformed CSV content
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The table does not have the expected layout
    #[error("Invalid ranking table: {0}")]
    Format(String),

    /// The journal picture cannot be decoded
    #[error("Image error: {0}")]
    Image(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RankingError {
    fn from(err: reqwest::Error) -> Self {
        RankingError::Network(err.to_string())
    }
}

impl From<image::ImageError> for RankingError {
    fn from(err: image::ImageError) -> Self {
        RankingError::Image(err.to_string())
    }
}

/// Normalize a category name for comparison: trimmed, lower-case, with
/// single spaces
pub fn format_category(category: &str) -> String {
    category
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Quartiles of one journal indexed by formatted category name, plus the
/// optional [`BEST`] entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalQuartiles {
    quartiles: BTreeMap<String, QuartileRanking>,
}

impl JournalQuartiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the quartile of a category; the name is formatted first
    pub fn insert(&mut self, category: &str, quartile: QuartileRanking) {
        let key = if category == BEST {
            BEST.to_string()
        } else {
            format_category(category)
        };
        if !key.is_empty() {
            self.quartiles.insert(key, quartile);
        }
    }

    /// Record the best quartile of the journal
    pub fn set_best(&mut self, quartile: QuartileRanking) {
        self.quartiles.insert(BEST.to_string(), quartile);
    }

    /// Quartile of exactly the given category
    pub fn get(&self, category: &str) -> Option<QuartileRanking> {
        self.quartiles.get(&format_category(category)).copied()
    }

    pub fn best(&self) -> Option<QuartileRanking> {
        self.quartiles.get(BEST).copied()
    }

    /// Category matching the given name, exactly or by similarity
    pub fn find_category(&self, category: &str) -> Option<(&str, QuartileRanking)> {
        let wanted = format_category(category);
        if wanted.is_empty() {
            return None;
        }
        if let Some((name, quartile)) = self.quartiles.get_key_value(&wanted) {
            return Some((name.as_str(), *quartile));
        }
        self.categories()
            .map(|(name, quartile)| (strsim::jaro_winkler(&wanted, name), name, quartile))
            .filter(|(score, _, _)| *score >= CATEGORY_SIMILARITY_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, name, quartile)| (name, quartile))
    }

    /// Quartile for the category: exact match, then closest similar
    /// category, then the best quartile of the journal
    pub fn resolve(&self, category: Option<&str>) -> Option<QuartileRanking> {
        category
            .and_then(|category| self.find_category(category))
            .map(|(_, quartile)| quartile)
            .or_else(|| self.best())
    }

    /// Category entries, without the [`BEST`] one
    pub fn categories(&self) -> impl Iterator<Item = (&str, QuartileRanking)> {
        self.quartiles
            .iter()
            .filter(|(name, _)| name.as_str() != BEST)
            .map(|(name, quartile)| (name.as_str(), *quartile))
    }

    /// Number of entries, including the [`BEST`] one
    pub fn len(&self) -> usize {
        self.quartiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quartiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quartiles() -> JournalQuartiles {
        let mut quartiles = JournalQuartiles::new();
        quartiles.insert("Computer Science Applications", QuartileRanking::Q1);
        quartiles.insert("  Control and   Systems Engineering ", QuartileRanking::Q2);
        quartiles.set_best(QuartileRanking::Q1);
        quartiles
    }

    #[test]
    fn test_format_category() {
        assert_eq!(format_category("  Artificial   Intelligence\t"), "artificial intelligence");
        assert_eq!(format_category(""), "");
    }

    #[test]
    fn test_exact_lookup() {
        let quartiles = quartiles();
        assert_eq!(quartiles.get("control and systems engineering"), Some(QuartileRanking::Q2));
        assert_eq!(quartiles.best(), Some(QuartileRanking::Q1));
        assert_eq!(quartiles.categories().count(), 2);
        assert_eq!(quartiles.len(), 3);
    }

    #[test]
    fn test_resolve() {
        let quartiles = quartiles();
        assert_eq!(
            quartiles.resolve(Some("Control and System Engineering")),
            Some(QuartileRanking::Q2)
        );
        assert_eq!(
            quartiles.find_category("CONTROL AND SYSTEMS ENGINEERING"),
            Some(("control and systems engineering", QuartileRanking::Q2))
        );
        // Unrelated category falls back to the best quartile
        assert_eq!(quartiles.resolve(Some("Oncology")), Some(QuartileRanking::Q1));
        assert_eq!(quartiles.resolve(None), Some(QuartileRanking::Q1));
        assert_eq!(JournalQuartiles::new().resolve(Some("Oncology")), None);
    }
}
