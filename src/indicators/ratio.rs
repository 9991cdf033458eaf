//! Paper production normalized by the research workforce.

use std::sync::Arc;

use super::{AnnualIndicator, Indicator, IndicatorCache, IndicatorError, IndicatorValue, ReferencePeriod};
use crate::models::ResearchOrganization;

/// Yearly number of papers per permanent researcher FTE.
///
/// The value is `papers / fte / years` where `papers` is the total of the
/// paper count indicator and `fte` the average FTE over the same window.
#[derive(Debug)]
pub struct PapersPerFteIndicator {
    papers: Arc<dyn AnnualIndicator>,
    fte: Arc<dyn AnnualIndicator>,
    cache: IndicatorCache,
}

impl PapersPerFteIndicator {
    /// Both indicators must cover the same years
    pub fn new(
        papers: Arc<dyn AnnualIndicator>,
        fte: Arc<dyn AnnualIndicator>,
    ) -> Result<Self, IndicatorError> {
        if papers.reference_period() != fte.reference_period() {
            return Err(IndicatorError::PeriodMismatch(format!(
                "{} covers {}-{} but {} covers {}-{}",
                papers.key(),
                papers.reference_start_year(),
                papers.reference_end_year(),
                fte.key(),
                fte.reference_start_year(),
                fte.reference_end_year()
            )));
        }
        Ok(Self {
            papers,
            fte,
            cache: IndicatorCache::new(),
        })
    }
}

impl Indicator for PapersPerFteIndicator {
    fn compute_key(&self) -> String {
        format!("{}_per_fte", self.papers.key())
    }

    fn label(&self) -> String {
        format!("{} per FTE and per year", self.papers.label())
    }

    fn reference_period(&self) -> &ReferencePeriod {
        self.papers.reference_period()
    }

    fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    fn compute_value(&self, organization: &ResearchOrganization) -> Result<IndicatorValue, IndicatorError> {
        let fte = self.fte.numeric_value(organization)?.as_f64();
        if fte <= 0.0 {
            return Err(IndicatorError::ZeroDenominator {
                key: self.key().to_string(),
                organization: organization.acronym.clone(),
            });
        }
        let papers = self.papers.numeric_value(organization)?.as_f64();
        let years = f64::from(self.papers.year_count());
        Ok(IndicatorValue::Float(papers / fte / years))
    }
}
