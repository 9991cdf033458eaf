//! Bibliometric indicators computed over research organizations.
//!
//! An [`Indicator`] is a named numeric computation over a
//! [`ResearchOrganization`] and a [`ReferencePeriod`]. Values are memoized
//! per organization until [`Indicator::clear`] is invoked.
//!
//! Two families exist:
//!
//! - instant indicators, whose period is reduced to the current day
//!   (e.g. [`ActiveMemberCountIndicator`]);
//! - [`AnnualIndicator`]s, whose period spans the last `N` completed
//!   calendar years and whose value folds a year → value map with a
//!   [`Combiner`] (e.g. [`RankedPaperCountIndicator`],
//!   [`PermanentResearcherFteIndicator`]).
//!
//! Ratio indicators ([`PapersPerFteIndicator`]) are built from two annual
//! indicators sharing the same window.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use lab_indicators::indicators::{
//!     Indicator, RankedPaperCountIndicator, RankingSystem, Venue,
//! };
//! use lab_indicators::models::ResearchOrganization;
//! use lab_indicators::sources::{InMemoryLabData, LabDataset};
//!
//! let source = Arc::new(InMemoryLabData::new(LabDataset::default()));
//! let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let indicator = RankedPaperCountIndicator::new(
//!     source, Venue::Journal, RankingSystem::Scimago, today, 5,
//! ).unwrap();
//!
//! let lab = ResearchOrganization::new(1, "LAB");
//! assert_eq!(indicator.key(), "scimago_journal_paper_count");
//! assert_eq!(indicator.numeric_value(&lab).unwrap().as_f64(), 0.0);
//! ```

mod cache;
mod fte;
mod members;
mod paper_count;
mod period;
mod ratio;
mod registry;
mod snapshot;

pub use cache::IndicatorCache;
pub use fte::PermanentResearcherFteIndicator;
pub use members::{ActiveMemberCountIndicator, MemberCategory};
pub use paper_count::{AuthorRole, RankedPaperCountIndicator, RankingSystem, Venue};
pub use period::{compute_end_date, compute_start_date, ReferencePeriod};
pub use ratio::PapersPerFteIndicator;
pub use registry::IndicatorRegistry;
pub use snapshot::IndicatorSnapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::ResearchOrganization;

/// Numeric value of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Integer(i64),
    Float(f64),
}

impl IndicatorValue {
    pub fn as_f64(self) -> f64 {
        match self {
            IndicatorValue::Integer(value) => value as f64,
            IndicatorValue::Float(value) => value,
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Integer(value) => write!(f, "{}", value),
            IndicatorValue::Float(value) => write!(f, "{:.2}", value),
        }
    }
}

/// Errors raised while computing indicators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    /// The reference period cannot be built
    #[error("Invalid reference period: {0}")]
    InvalidPeriod(String),

    /// Composed indicators do not cover the same years
    #[error("Period mismatch: {0}")]
    PeriodMismatch(String),

    /// A ratio has a null denominator
    #[error("Indicator '{key}' divides by zero for organization {organization}")]
    ZeroDenominator { key: String, organization: String },

    /// Unknown indicator key
    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),
}

/// How a year → value map is folded into a single value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combiner {
    #[default]
    Sum,
    Mean,
    Max,
    Min,
}

impl Combiner {
    /// Fold the values; an empty map gives zero
    pub fn combine(self, values: &BTreeMap<i32, f64>) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let it = values.values().copied();
        match self {
            Combiner::Sum => it.sum(),
            Combiner::Mean => it.sum::<f64>() / values.len() as f64,
            Combiner::Max => it.fold(f64::NEG_INFINITY, f64::max),
            Combiner::Min => it.fold(f64::INFINITY, f64::min),
        }
    }
}

/// A named, memoized numeric computation over a research organization.
///
/// Implementors provide [`compute_key`](Indicator::compute_key),
/// [`compute_value`](Indicator::compute_value) and access to their
/// [`IndicatorCache`]; the memoization logic is shared.
pub trait Indicator: Send + Sync + std::fmt::Debug {
    /// Build the key of the indicator; called once, see [`Indicator::key`]
    fn compute_key(&self) -> String;

    /// Human-readable name
    fn label(&self) -> String;

    /// Period covered by the indicator
    fn reference_period(&self) -> &ReferencePeriod;

    /// Storage for the key and the memoized values
    fn cache(&self) -> &IndicatorCache;

    /// Compute the value without looking at the memoized ones
    fn compute_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError>;

    /// Stable identifier of the indicator
    fn key(&self) -> &str {
        self.cache().key(|| self.compute_key())
    }

    /// Value for the organization, computed on first request only.
    ///
    /// Errors are not memoized.
    fn numeric_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError> {
        if let Some(value) = self.cache().get(organization.id) {
            return Ok(value);
        }
        tracing::debug!(
            indicator = self.key(),
            organization = %organization.acronym,
            "Computing indicator"
        );
        let value = self.compute_value(organization)?;
        tracing::debug!(
            indicator = self.key(),
            organization = %organization.acronym,
            value = %value,
            "Indicator computed"
        );
        self.cache().insert(organization.id, value);
        Ok(value)
    }

    /// Forget every memoized value
    fn clear(&self) {
        self.cache().clear();
    }
}

/// Indicator aggregated over the last `year_count` completed years
pub trait AnnualIndicator: Indicator {
    /// Folding applied to [`AnnualIndicator::values_per_year`]
    fn combiner(&self) -> Combiner;

    /// One value per year of the reference period
    fn values_per_year(&self, organization: &ResearchOrganization) -> Result<BTreeMap<i32, f64>, IndicatorError>;

    fn year_count(&self) -> u32 {
        self.reference_period().year_count()
    }

    fn reference_start_year(&self) -> i32 {
        self.reference_period().start_year()
    }

    fn reference_end_year(&self) -> i32 {
        self.reference_period().end_year()
    }

    /// Fold the yearly values with the combiner
    fn combined_value(&self, organization: &ResearchOrganization) -> Result<f64, IndicatorError> {
        let values = self.values_per_year(organization)?;
        Ok(self.combiner().combine(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combiner() {
        let values: BTreeMap<i32, f64> = [(2021, 2.0), (2022, 4.0), (2023, 0.0)].into();
        assert_eq!(Combiner::Sum.combine(&values), 6.0);
        assert_eq!(Combiner::Mean.combine(&values), 2.0);
        assert_eq!(Combiner::Max.combine(&values), 4.0);
        assert_eq!(Combiner::Min.combine(&values), 0.0);
        assert_eq!(Combiner::Max.combine(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_value_json() {
        let values = vec![IndicatorValue::Integer(3), IndicatorValue::Float(1.25)];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, "[3,1.25]");
        let back: Vec<IndicatorValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(IndicatorValue::Integer(12).to_string(), "12");
        assert_eq!(IndicatorValue::Float(1.0 / 3.0).to_string(), "0.33");
    }
}
