//! Reference periods over which indicators aggregate data.

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::IndicatorError;

/// Start of a window of `year_count` full calendar years ending the year
/// before `current_year`: January 1st of `current_year - year_count`.
pub fn compute_start_date(current_year: i32, year_count: u32) -> Result<NaiveDate, IndicatorError> {
    let year = i64::from(current_year) - 1 - i64::from(year_count) + 1;
    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .ok_or_else(|| IndicatorError::InvalidPeriod(format!("no start date for year {}", year)))
}

/// December 31st of the year `years_before` years before the last completed
/// year, i.e. `compute_end_date(y, 0)` is the last day of `y - 1`.
pub fn compute_end_date(current_year: i32, years_before: u32) -> Result<NaiveDate, IndicatorError> {
    let year = i64::from(current_year) - 1 - i64::from(years_before);
    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 12, 31))
        .ok_or_else(|| IndicatorError::InvalidPeriod(format!("no end date for year {}", year)))
}

/// Inclusive date range an indicator is computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReferencePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, IndicatorError> {
        if start > end {
            return Err(IndicatorError::InvalidPeriod(format!(
                "{} is after {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Single-day period, used by indicators describing the current state
    pub fn instant(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: today,
        }
    }

    /// The `year_count` full calendar years preceding the year of `today`.
    ///
    /// The running year is never part of the window since its data is
    /// still incomplete.
    pub fn trailing_years(today: NaiveDate, year_count: u32) -> Result<Self, IndicatorError> {
        if year_count == 0 {
            return Err(IndicatorError::InvalidPeriod(
                "an annual indicator needs at least one year".to_string(),
            ));
        }
        let current_year = today.year();
        Self::new(
            compute_start_date(current_year, year_count)?,
            compute_end_date(current_year, 0)?,
        )
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_year(&self) -> i32 {
        self.start.year()
    }

    pub fn end_year(&self) -> i32 {
        self.end.year()
    }

    /// Number of calendar years touched by the period
    pub fn year_count(&self) -> u32 {
        (self.end_year() - self.start_year() + 1).unsigned_abs()
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year()..=self.end_year()
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years().contains(&year)
    }

    /// Keep the items whose year lies in `[start_year, end_year]`.
    ///
    /// The filter runs on the rayon pool; the relative order of the kept
    /// items is preserved.
    pub fn filter_by_year_window<T, F>(&self, items: Vec<T>, year_of: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&T) -> i32 + Sync + Send,
    {
        let years = self.years();
        items
            .into_par_iter()
            .filter(|item| years.contains(&year_of(item)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compute_dates() {
        assert_eq!(compute_start_date(2024, 3).unwrap(), date(2021, 1, 1));
        assert_eq!(compute_start_date(2024, 1).unwrap(), date(2023, 1, 1));
        assert_eq!(compute_end_date(2024, 0).unwrap(), date(2023, 12, 31));
        assert_eq!(compute_end_date(2024, 2).unwrap(), date(2021, 12, 31));
    }

    #[test]
    fn test_trailing_years_window() {
        for year_count in 1..=10 {
            let period = ReferencePeriod::trailing_years(date(2026, 10, 17), year_count).unwrap();
            assert_eq!(period.end_year(), period.start_year() + year_count as i32 - 1);
            assert_eq!(period.end(), date(2025, 12, 31));
            assert_eq!(period.year_count(), year_count);
        }
    }

    #[test]
    fn test_trailing_years_excludes_running_year() {
        let period = ReferencePeriod::trailing_years(date(2024, 1, 1), 5).unwrap();
        assert_eq!(period.start(), date(2019, 1, 1));
        assert!(!period.contains_year(2024));
        assert!(period.contains_year(2023));
        assert!(!period.contains_year(2018));
    }

    #[test]
    fn test_zero_years_rejected() {
        assert!(matches!(
            ReferencePeriod::trailing_years(date(2024, 6, 1), 0),
            Err(IndicatorError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_instant_period() {
        let today = date(2024, 6, 1);
        let period = ReferencePeriod::instant(today);
        assert_eq!(period.start(), today);
        assert_eq!(period.end(), today);
        assert_eq!(period.year_count(), 1);
    }

    #[test]
    fn test_inverted_period_rejected() {
        assert!(ReferencePeriod::new(date(2024, 1, 2), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_filter_by_year_window() {
        let period = ReferencePeriod::trailing_years(date(2024, 3, 1), 2).unwrap();
        let items = vec![(1, 2020), (2, 2022), (3, 2023), (4, 2024), (5, 2022)];
        let kept = period.filter_by_year_window(items, |item| item.1);
        assert_eq!(kept, vec![(2, 2022), (3, 2023), (5, 2022)]);
    }
}
